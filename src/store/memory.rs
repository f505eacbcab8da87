use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordStore, StoreError};
use crate::model::attendance::AttendanceRecord;

/// Process-local record store.
///
/// Besides backing tests it counts writes and can be told to fail, so the
/// workflows' error paths can be driven without a database.
pub struct MemoryRecordStore {
    records: Mutex<Vec<AttendanceRecord>>,
    pub insert_calls: AtomicU64,
    pub query_calls: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    /// Deletes succeed this many times, then fail. `usize::MAX` never fails.
    deletes_before_failure: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            insert_calls: AtomicU64::new(0),
            query_calls: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            deletes_before_failure: AtomicUsize::new(usize::MAX),
        }
    }

    #[cfg(test)]
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn fail_deletes_after(&self, successful: usize) {
        self.deletes_before_failure.store(successful, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    #[cfg(test)]
    pub async fn count_employee(&self, numero_empleado: &str) -> usize {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.numero_empleado == numero_empleado)
            .count()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        self.check_writes()?;
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_reads()?;
        Ok(self.records.lock().await.clone())
    }

    async fn find_by_employee(
        &self,
        numero_empleado: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        self.check_reads()?;
        self.query_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.numero_empleado == numero_empleado)
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check_writes()?;
        let allowed = self
            .deletes_before_failure
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if !allowed {
            return Err(StoreError::Unavailable("delete rejected".to_string()));
        }

        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
