//! Persistence of attendance records.
//!
//! The record store is one flat collection keyed by document id. Employee
//! numbers are not constrained by the store; duplicates are kept out by
//! the check-in workflow querying before it inserts.

mod memory;
mod mysql;

pub use memory::MemoryRecordStore;
pub use mysql::MySqlRecordStore;

use async_trait::async_trait;

use crate::model::attendance::AttendanceRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError>;

    /// Every stored record, oldest first.
    async fn fetch_all(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn find_by_employee(
        &self,
        numero_empleado: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Returns false when no record had this id.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
