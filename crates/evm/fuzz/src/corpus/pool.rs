use alloy_primitives::map::IndexSet;
use std::{fmt::Debug, hash::Hash};

/// A deduplicated collection of values, retrieved round-robin in insertion order.
#[derive(Clone, Debug)]
pub struct ValuePool<T> {
    name: &'static str,
    values: IndexSet<T>,
    cursor: usize,
}

impl<T: Clone + Debug + Default + Eq + Hash> ValuePool<T> {
    pub fn new(name: &'static str) -> Self {
        Self { name, values: IndexSet::default(), cursor: 0 }
    }

    /// Inserts `value` if it is not present yet.
    ///
    /// Returns `true` if the value was inserted. The cursor is never moved.
    pub fn add(&mut self, value: T) -> bool {
        if self.values.contains(&value) {
            return false;
        }
        trace!(target: "corpus", pool = self.name, ?value, "adding value");
        self.values.insert(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.values.contains(value)
    }

    /// Returns the value at the cursor and moves the cursor to the next value, wrapping around at
    /// the end.
    ///
    /// Returns the zero value of `T` if the pool is empty.
    pub fn next_value(&mut self) -> T {
        let Some(value) = self.values.get_index(self.cursor) else { return T::default() };
        let value = value.clone();
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}
