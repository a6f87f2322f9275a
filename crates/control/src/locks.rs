use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Single-writer gate per record id.
///
/// Holders of the guard for an id are the only ones allowed to run a
/// read-modify-write cycle on that record. Idle entries are pruned on the
/// next acquisition.
#[derive(Default)]
pub struct KeyedLocks {
    entries: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self.entries.lock().await;
            entries.retain(|key, lock| *key == id || Arc::strong_count(lock) > 1);
            entries.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let id = Uuid::new_v4();
        let counter = Arc::new(Mutex::new(Vec::new()));

        let guard = locks.acquire(id).await;

        let task = {
            let locks = locks.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
                counter.lock().await.push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        counter.lock().await.push("first");
        drop(guard);
        task.await.unwrap();

        assert_eq!(*counter.lock().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4())).await;
        assert!(b.is_ok());
    }
}
