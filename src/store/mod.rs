//! Fixed-capacity, in-memory list of users.
//!
//! The store always starts from a small baseline (`[10, 20]` by default)
//! which only an explicit [`Store::reset`] restores. It is owned by the
//! router behind a [`SharedStore`] lock; nothing else mutates it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 100;

/// Entries present at startup and after a reset.
pub const BASELINE: [i32; 2] = [10, 20];

/// The store as shared between connection tasks.
pub type SharedStore = Arc<Mutex<Store>>;

/// Errors produced by store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("store is empty")]
    Empty,

    #[error("requested {requested} entries but only {available} exist")]
    InsufficientEntries { requested: usize, available: usize },

    #[error("baseline of {baseline} entries does not fit capacity {capacity}")]
    BaselineExceedsCapacity { baseline: usize, capacity: usize },
}

/// Result of [`Store::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Whether anything was truncated.
    pub reset: bool,
    /// Entry count after the call.
    pub count: usize,
}

/// An ordered, bounded list of integers.
///
/// # Examples
///
/// ```
/// use userbox::store::Store;
///
/// let mut store = Store::new(100);
/// assert_eq!(store.count(), 2);
///
/// assert_eq!(store.add(7).unwrap(), 3);
/// assert_eq!(store.last().unwrap(), 7);
///
/// let outcome = store.reset();
/// assert!(outcome.reset);
/// assert_eq!(store.snapshot(), vec![10, 20]);
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    entries: Vec<i32>,
    baseline: Vec<i32>,
    capacity: usize,
    added: u32,
}

impl Store {
    /// Creates a store seeded with [`BASELINE`].
    ///
    /// A capacity below the baseline size is raised to fit it.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(BASELINE.len());
        Self {
            entries: BASELINE.to_vec(),
            baseline: BASELINE.to_vec(),
            capacity,
            added: 0,
        }
    }

    /// Creates a store seeded with a custom baseline.
    ///
    /// # Errors
    ///
    /// [`StoreError::BaselineExceedsCapacity`] if `baseline` does not fit.
    pub fn with_baseline(capacity: usize, baseline: Vec<i32>) -> Result<Self, StoreError> {
        if baseline.len() > capacity {
            return Err(StoreError::BaselineExceedsCapacity {
                baseline: baseline.len(),
                capacity,
            });
        }
        Ok(Self {
            entries: baseline.clone(),
            baseline,
            capacity,
            added: 0,
        })
    }

    /// Wraps the store for sharing across connection tasks.
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Appends `value` and returns the new count.
    ///
    /// # Errors
    ///
    /// [`StoreError::Full`] when the store already holds `capacity` entries.
    pub fn add(&mut self, value: i32) -> Result<usize, StoreError> {
        if self.entries.len() >= self.capacity {
            return Err(StoreError::Full {
                capacity: self.capacity,
            });
        }
        self.entries.push(value);
        self.added = self.added.saturating_add(1);
        Ok(self.entries.len())
    }

    /// Restores the baseline if anything was added beyond it.
    ///
    /// At or below the baseline size this is a no-op that reports
    /// `reset: false`.
    pub fn reset(&mut self) -> ResetOutcome {
        if self.entries.len() > self.baseline.len() {
            self.entries.clone_from(&self.baseline);
            self.added = 0;
            ResetOutcome {
                reset: true,
                count: self.entries.len(),
            }
        } else {
            ResetOutcome {
                reset: false,
                count: self.entries.len(),
            }
        }
    }

    /// Returns a copy of every entry in insertion order.
    pub fn snapshot(&self) -> Vec<i32> {
        self.entries.clone()
    }

    /// Returns the first `n` entries.
    ///
    /// # Errors
    ///
    /// [`StoreError::InsufficientEntries`] when fewer than `n` exist.
    pub fn leading(&self, n: usize) -> Result<Vec<i32>, StoreError> {
        self.entries
            .get(..n)
            .map(<[i32]>::to_vec)
            .ok_or(StoreError::InsufficientEntries {
                requested: n,
                available: self.entries.len(),
            })
    }

    /// Returns the most recently appended entry.
    ///
    /// # Errors
    ///
    /// [`StoreError::Empty`] when the store has no entries.
    pub fn last(&self) -> Result<i32, StoreError> {
        self.entries.last().copied().ok_or(StoreError::Empty)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Number of successful [`add`](Self::add) calls since the last reset.
    pub fn added(&self) -> u32 {
        self.added
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_baseline() {
        let store = Store::default();
        assert_eq!(store.snapshot(), vec![10, 20]);
        assert_eq!(store.count(), 2);
        assert_eq!(store.added(), 0);
        assert_eq!(store.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn add_appends_and_counts() {
        let mut store = Store::default();
        for n in 1..=10 {
            assert_eq!(store.add(n).unwrap(), 2 + n as usize);
        }
        assert_eq!(store.count(), 12);
        assert_eq!(store.added(), 10);
        assert_eq!(store.last().unwrap(), 10);
    }

    #[test]
    fn add_beyond_capacity_fails() {
        let mut store = Store::new(4);
        assert_eq!(store.add(1).unwrap(), 3);
        assert_eq!(store.add(2).unwrap(), 4);
        assert_eq!(store.add(3).unwrap_err(), StoreError::Full { capacity: 4 });
        assert_eq!(store.snapshot(), vec![10, 20, 1, 2]);
        assert_eq!(store.added(), 2);
    }

    #[test]
    fn reset_restores_baseline() {
        let mut store = Store::default();
        store.add(5).unwrap();
        store.add(6).unwrap();
        let outcome = store.reset();
        assert_eq!(
            outcome,
            ResetOutcome {
                reset: true,
                count: 2
            }
        );
        assert_eq!(store.snapshot(), vec![10, 20]);
        assert_eq!(store.added(), 0);
    }

    #[test]
    fn reset_at_baseline_is_noop() {
        let mut store = Store::default();
        let outcome = store.reset();
        assert_eq!(
            outcome,
            ResetOutcome {
                reset: false,
                count: 2
            }
        );
        assert_eq!(store.snapshot(), vec![10, 20]);
    }

    #[test]
    fn last_on_empty_store_fails() {
        let mut store = Store::with_baseline(3, Vec::new()).unwrap();
        assert_eq!(store.last().unwrap_err(), StoreError::Empty);
        store.add(9).unwrap();
        assert_eq!(store.last().unwrap(), 9);
    }

    #[test]
    fn leading_is_bounded_by_count() {
        let mut store = Store::default();
        assert_eq!(
            store.leading(5).unwrap_err(),
            StoreError::InsufficientEntries {
                requested: 5,
                available: 2
            }
        );
        for n in 0..4 {
            store.add(n).unwrap();
        }
        assert_eq!(store.leading(5).unwrap(), vec![10, 20, 0, 1, 2]);
    }

    #[test]
    fn baseline_must_fit() {
        let err = Store::with_baseline(1, vec![1, 2]).unwrap_err();
        assert_eq!(
            err,
            StoreError::BaselineExceedsCapacity {
                baseline: 2,
                capacity: 1
            }
        );
    }

    #[test]
    fn tiny_capacity_is_raised_to_baseline() {
        let mut store = Store::new(0);
        assert_eq!(store.capacity(), 2);
        assert!(matches!(store.add(1), Err(StoreError::Full { .. })));
    }
}
