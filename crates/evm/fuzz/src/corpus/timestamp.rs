use std::time::{SystemTime, UNIX_EPOCH};

/// Candidate block timestamps, kept in ascending order.
///
/// The cursor selects the timestamp of the current block. Advancing past the last timestamp
/// wraps to the first one, which completes a lap.
#[derive(Clone, Debug, Default)]
pub struct TimestampPool {
    values: Vec<u64>,
    cursor: usize,
}

impl TimestampPool {
    /// Inserts `timestamp` at its sorted position if it is not present yet.
    pub fn add(&mut self, timestamp: u64) -> bool {
        match self.values.binary_search(&timestamp) {
            Ok(_) => false,
            Err(index) => {
                trace!(target: "corpus", pool = "timestamp", timestamp, "adding value");
                self.values.insert(index, timestamp);
                true
            }
        }
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        self.values.binary_search(&timestamp).is_ok()
    }

    /// Returns the timestamp at the cursor, or the current time if the pool is empty.
    pub fn current(&self) -> u64 {
        self.values.get(self.cursor).copied().unwrap_or_else(now)
    }

    /// Advances the cursor and returns the timestamp it now points to, together with whether the
    /// cursor wrapped around to the first timestamp.
    ///
    /// If the pool is empty the current time is returned and no lap is reported.
    pub fn next_or_now(&mut self) -> (u64, bool) {
        if self.values.is_empty() {
            return (now(), false);
        }
        self.cursor = (self.cursor + 1) % self.values.len();
        (self.values[self.cursor], self.cursor == 0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
