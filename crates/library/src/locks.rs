//! One async lock per key, created on demand.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes work on the same key (a source URL) while letting different
/// keys proceed concurrently. Entries are dropped once nobody holds them.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}
impl KeyedLocks {
    pub(crate) async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(key.to_string(), Arc::downgrade(&lock));
                    lock
                },
            }
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.values().filter(|lock| lock.strong_count() > 0).count()
    }
}
