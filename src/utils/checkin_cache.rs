use anyhow::Result;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::store::RecordStore;

/// Employee numbers known to be checked in.
///
/// Only positives are cached: a hit means the record store already holds
/// a check-in for that employee, a miss means "ask the store".
pub struct CheckinCache {
    seen: Cache<String, ()>,
    /// bumped on every `invalidate_all`
    epoch: AtomicU64,
}

#[inline]
fn normalize(numero_empleado: &str) -> String {
    numero_empleado.trim().to_string()
}

impl CheckinCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            seen: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Mark a single employee as checked in
    pub async fn mark_seen(&self, numero_empleado: &str) {
        self.seen.insert(normalize(numero_empleado), ()).await;
    }

    pub async fn is_seen(&self, numero_empleado: &str) -> bool {
        self.seen.get(&normalize(numero_empleado)).await.is_some()
    }

    /// Forget everything, used after the record store has been cleared.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.seen.invalidate_all();
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn batch_mark(&self, numbers: &[String]) {
        let futures: Vec<_> = numbers
            .iter()
            .map(|n| self.seen.insert(normalize(n), ()))
            .collect();

        futures::future::join_all(futures).await;
    }

    /// Load the employee numbers already in the record store (batched)
    ///
    /// Gives up, leaving the cache empty, if the cache is invalidated while
    /// the warmup runs: the records it read may no longer exist.
    pub async fn warmup(&self, store: &dyn RecordStore, batch_size: usize) -> Result<usize> {
        let started = self.epoch();
        let records = store.fetch_all().await?;
        let batch_size = batch_size.max(1);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total_count = 0usize;

        for record in records {
            batch.push(record.numero_empleado);
            total_count += 1;

            if batch.len() >= batch_size {
                self.warmup_batch(&batch, started).await?;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.warmup_batch(&batch, started).await?;
        }

        log::info!(
            "Check-in cache warmup complete: {} employees from {} store",
            total_count,
            store.backend_tag()
        );

        Ok(total_count)
    }

    async fn warmup_batch(&self, numbers: &[String], started: u64) -> Result<()> {
        if self.epoch() == started {
            self.batch_mark(numbers).await;
        }
        if self.epoch() != started {
            // a mark may have landed after the clear
            self.seen.invalidate_all();
            anyhow::bail!("check-in cache invalidated during warmup");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceRecord;
    use crate::model::payload::ScanPayload;
    use crate::store::{MemoryRecordStore, StoreError};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn cache() -> CheckinCache {
        CheckinCache::new(1_000, Duration::from_secs(60))
    }

    #[actix_web::test]
    async fn marks_and_forgets() {
        let cache = cache();
        assert!(!cache.is_seen("E100").await);

        cache.mark_seen(" E100 ").await;
        assert!(cache.is_seen("E100").await);

        cache.invalidate_all();
        assert!(!cache.is_seen("E100").await);
    }

    #[actix_web::test]
    async fn warmup_loads_every_stored_employee() {
        let store = MemoryRecordStore::new();
        for n in ["E1", "E2", "E3"] {
            let payload = ScanPayload::parse(&format!(r#"{{"numeroEmpleado":"{n}"}}"#)).unwrap();
            store
                .insert(&AttendanceRecord::from_payload(payload, "t".into()))
                .await
                .unwrap();
        }

        let cache = cache();
        let loaded = cache.warmup(&store, 2).await.unwrap();

        assert_eq!(loaded, 3);
        for n in ["E1", "E2", "E3"] {
            assert!(cache.is_seen(n).await);
        }
        assert!(!cache.is_seen("E4").await);
    }

    /// Store that clears the cache right after being listed, like a bulk
    /// clear landing while the warmup is in flight.
    struct ClearedMidWarmup {
        inner: MemoryRecordStore,
        cache: Arc<CheckinCache>,
    }

    #[async_trait]
    impl RecordStore for ClearedMidWarmup {
        fn backend_tag(&self) -> &'static str {
            "cleared"
        }

        async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
            self.inner.insert(record).await
        }

        async fn fetch_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
            let records = self.inner.fetch_all().await?;
            self.cache.invalidate_all();
            Ok(records)
        }

        async fn find_by_employee(
            &self,
            numero_empleado: &str,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            self.inner.find_by_employee(numero_empleado).await
        }

        async fn delete(&self, id: &str) -> Result<bool, StoreError> {
            self.inner.delete(id).await
        }
    }

    #[actix_web::test]
    async fn warmup_does_not_repopulate_after_clear() {
        let cache = Arc::new(cache());
        let store = ClearedMidWarmup {
            inner: MemoryRecordStore::new(),
            cache: cache.clone(),
        };
        let payload = ScanPayload::parse(r#"{"numeroEmpleado":"E1"}"#).unwrap();
        store
            .insert(&AttendanceRecord::from_payload(payload, "t".into()))
            .await
            .unwrap();

        assert!(cache.warmup(&store, 10).await.is_err());
        assert!(!cache.is_seen("E1").await);
    }
}
