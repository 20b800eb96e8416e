//! The single world state checkpoint of a fuzzing session.

use crate::backend::ExecutionBackend;

/// Holds at most one snapshot of the backend state.
///
/// Reverting keeps the snapshot, so the state can be reset to the same point any number of times.
pub struct SnapshotController<B: ExecutionBackend> {
    snapshot: Option<B::Snapshot>,
}

impl<B: ExecutionBackend> Default for SnapshotController<B> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

impl<B: ExecutionBackend> SnapshotController<B> {
    /// Captures the current state of `backend`, replacing any previous snapshot.
    pub fn take(&mut self, backend: &B) {
        self.snapshot = Some(backend.snapshot());
        debug!(target: "snapshot", "took state snapshot");
    }

    /// Restores `backend` to the snapshot.
    ///
    /// Returns `false` if no snapshot was taken.
    pub fn revert(&self, backend: &mut B) -> bool {
        let Some(snapshot) = &self.snapshot else { return false };
        backend.restore(snapshot);
        debug!(target: "snapshot", "reverted to state snapshot");
        true
    }
}
