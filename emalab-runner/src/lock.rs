//! Per-symbol single-flight locks.
//!
//! Runs on the same symbol are serialized; runs on different symbols do not
//! contend. A caller that finds its symbol busy blocks until the holder is done.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use tracing::debug;

#[derive(Debug, Default)]
pub struct RunLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// The guarded value is `()`, so a lock poisoned by a panicking run is
    /// simply taken over.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(key);
        let _guard = match lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!(key, "run already in progress, waiting");
                lock.lock().unwrap_or_else(PoisonError::into_inner)
            }
        };
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn key_count(locks: &RunLocks) -> usize {
        locks.locks.lock().unwrap().len()
    }

    #[test]
    fn same_key_is_serialized() {
        let locks = Arc::new(RunLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let (locks, active, max_active) =
                    (Arc::clone(&locks), Arc::clone(&active), Arc::clone(&max_active));
                thread::spawn(move || {
                    locks.with_lock("NEPSE", || {
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        max_active.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        active.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
        assert_eq!(key_count(&locks), 1);
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = RunLocks::new();
        let inner = locks.with_lock("A", || locks.with_lock("B", || 7));
        assert_eq!(inner, 7);
        assert_eq!(key_count(&locks), 2);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let locks = Arc::new(RunLocks::new());
        let l = Arc::clone(&locks);
        let _ = thread::spawn(move || l.with_lock("NEPSE", || panic!("run failed"))).join();
        assert_eq!(locks.with_lock("NEPSE", || 1), 1);
    }
}
