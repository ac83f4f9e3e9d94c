//! Lock helpers that recover from poisoning.
//!
//! Every guarded value here is replaced or updated in a single step, so a
//! panic in another holder never leaves it half-written.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn lock<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!(lock = what, "Recovered poisoned lock");
        PoisonError::into_inner(poisoned)
    })
}

pub(crate) fn read<'a, T>(rw: &'a RwLock<T>, what: &'static str) -> RwLockReadGuard<'a, T> {
    rw.read().unwrap_or_else(|poisoned| {
        warn!(lock = what, "Recovered poisoned lock");
        PoisonError::into_inner(poisoned)
    })
}

pub(crate) fn write<'a, T>(rw: &'a RwLock<T>, what: &'static str) -> RwLockWriteGuard<'a, T> {
    rw.write().unwrap_or_else(|poisoned| {
        warn!(lock = what, "Recovered poisoned lock");
        PoisonError::into_inner(poisoned)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn poisoned_mutex_is_recovered() {
        let shared = Arc::new(Mutex::new(5));
        let clone = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = clone.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(shared.is_poisoned());
        assert_eq!(*lock(&shared, "test"), 5);
    }

    #[test]
    fn poisoned_rwlock_is_recovered() {
        let shared = Arc::new(RwLock::new(1));
        let clone = Arc::clone(&shared);
        let _ = thread::spawn(move || {
            let _guard = clone.write().unwrap();
            panic!("poison");
        })
        .join();

        *write(&shared, "test") += 1;
        assert_eq!(*read(&shared, "test"), 2);
    }
}
