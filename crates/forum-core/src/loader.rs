//! Request-scoped batching loader.
//!
//! A [`Loader`] collects keys, fetches all cache misses with a single
//! [`BatchFn`] call, and memoises every answer (absences included) until it
//! is dropped. Build one per request; never share across requests.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::DomainError;

/// Fetches many values in one round trip.
#[async_trait]
pub trait BatchFn<K, V>: Send + Sync {
    /// Keys absent from the returned map are treated as missing.
    async fn load(&self, keys: &[K]) -> Result<HashMap<K, V>, DomainError>;
}

pub struct Loader<K, V> {
    batch: Arc<dyn BatchFn<K, V>>,
    memo: Mutex<HashMap<K, Option<V>>>,
}

impl<K, V> Loader<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(batch: Arc<dyn BatchFn<K, V>>) -> Self {
        Self {
            batch,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub async fn load(&self, key: K) -> Result<Option<V>, DomainError> {
        let mut values = self.load_many(std::slice::from_ref(&key)).await?;
        Ok(values.pop().flatten())
    }

    /// Values in the same order as `keys`.
    pub async fn load_many(&self, keys: &[K]) -> Result<Vec<Option<V>>, DomainError> {
        let mut memo = self.memo.lock().await;

        let mut seen = HashSet::new();
        let misses: Vec<K> = keys
            .iter()
            .filter(|k| !memo.contains_key(*k) && seen.insert((*k).clone()))
            .cloned()
            .collect();

        if !misses.is_empty() {
            tracing::trace!(batch_size = misses.len(), "Loader batch fetch");
            let mut found = self.batch.load(&misses).await?;
            for key in misses {
                let value = found.remove(&key);
                memo.insert(key, value);
            }
        }

        Ok(keys
            .iter()
            .map(|k| memo.get(k).cloned().flatten())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Squares {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BatchFn<u32, u64> for Squares {
        async fn load(&self, keys: &[u32]) -> Result<HashMap<u32, u64>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // odd keys "do not exist"
            Ok(keys
                .iter()
                .filter(|k| *k % 2 == 0)
                .map(|k| (*k, u64::from(*k) * u64::from(*k)))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_load_many_batches_and_memoises() {
        let batch = Arc::new(Squares {
            calls: AtomicUsize::new(0),
        });
        let dyn_batch: Arc<dyn BatchFn<u32, u64>> = batch.clone();
        let loader = Loader::new(dyn_batch);

        let values = loader.load_many(&[2, 3, 4, 2]).await.unwrap();
        assert_eq!(values, vec![Some(4), None, Some(16), Some(4)]);
        assert_eq!(batch.calls.load(Ordering::SeqCst), 1);

        // Hits and remembered misses do not call the batch again.
        assert_eq!(loader.load(4).await.unwrap(), Some(16));
        assert_eq!(loader.load(3).await.unwrap(), None);
        assert_eq!(batch.calls.load(Ordering::SeqCst), 1);

        assert_eq!(loader.load(6).await.unwrap(), Some(36));
        assert_eq!(batch.calls.load(Ordering::SeqCst), 2);
    }
}
