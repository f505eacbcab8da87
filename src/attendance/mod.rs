//! Check-in workflows over the record store and the in-memory board.
//!
//! The board is the list the operator sees. It is loaded once from the
//! store, grows with every accepted scan and is emptied by a bulk clear;
//! exports are produced from it without going back to the store.

pub mod clear;
pub mod export;
pub mod ingest;
pub mod notify;

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::model::attendance::AttendanceRecord;
use crate::store::{RecordStore, StoreError};
use crate::utils::checkin_cache::CheckinCache;
use notify::Notifier;

pub struct AttendanceService {
    store: Arc<dyn RecordStore>,
    board: RwLock<Vec<AttendanceRecord>>,
    cache: CheckinCache,
    notifier: Notifier,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn RecordStore>, cache: CheckinCache, notifier: Notifier) -> Self {
        Self {
            store,
            board: RwLock::new(Vec::new()),
            cache,
            notifier,
        }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn cache(&self) -> &CheckinCache {
        &self.cache
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Replace the board with what the store currently holds.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let records = self.store.fetch_all().await?;
        let count = records.len();
        *self.board.write().await = records;
        Ok(count)
    }

    pub async fn records(&self) -> Vec<AttendanceRecord> {
        self.board.read().await.clone()
    }
}
