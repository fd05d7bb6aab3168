//! Per-internship transition locks
//!
//! Transitions suspend on persistence between their guard check and their
//! commit. Holding one lock per internship id across that window keeps two
//! concurrent transitions on the same record from both passing the guard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

/// Registry of one async mutex per internship id
#[derive(Debug, Clone, Default)]
pub struct TransitionLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>>,
}

impl TransitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding transitions of `internship_id`
    pub fn for_internship(&self, internship_id: i64) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop locks nobody holds any more
        locks.retain(|id, lock| *id == internship_id || Arc::strong_count(lock) > 1);

        locks.entry(internship_id).or_default().clone()
    }

    /// Number of ids currently tracked
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_shares_lock() {
        let locks = TransitionLocks::new();
        let a = locks.for_internship(1);
        let b = locks.for_internship(1);

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unused_locks_are_pruned() {
        let locks = TransitionLocks::new();
        drop(locks.for_internship(1));
        let _held = locks.for_internship(2);

        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_lock_excludes_second_holder() {
        let locks = TransitionLocks::new();
        let guard = locks.for_internship(3).lock_owned().await;

        assert!(locks.for_internship(3).try_lock().is_err());
        drop(guard);
        assert!(locks.for_internship(3).try_lock().is_ok());
    }
}
