use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::AttendanceService;
use super::notify::{CLEAR_FAILED_MESSAGE, Notification};
use crate::store::StoreError;

/// Operator's answer to "delete every record?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed { Self::Confirmed } else { Self::Cancelled }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    Cancelled,
    Cleared { deleted: usize },
    /// Some deletes went through; nothing is retried or restored.
    Failed { deleted: usize, failed: usize },
}

impl AttendanceService {
    /// Delete every stored record, one delete per record, awaited as a batch.
    pub async fn clear_all(&self, confirmation: Confirmation) -> ClearOutcome {
        if confirmation == Confirmation::Cancelled {
            info!("Bulk clear cancelled");
            return ClearOutcome::Cancelled;
        }

        let outcome = match self.store.fetch_all().await {
            Ok(records) => {
                let results = join_all(
                    records
                        .iter()
                        .map(|r| async move { (r.id.as_str(), self.store.delete(&r.id).await) }),
                )
                .await;
                tally(results)
            }
            Err(e) => {
                error!(error = %e, "Bulk clear could not list records");
                ClearOutcome::Failed {
                    deleted: 0,
                    failed: 0,
                }
            }
        };

        self.cache.invalidate_all();

        match outcome {
            ClearOutcome::Cleared { deleted } => {
                self.board.write().await.clear();
                info!(deleted, "Attendance records cleared");
                self.notifier.notify(Notification::Cleared { deleted });
            }
            ClearOutcome::Failed { deleted, failed } => {
                error!(deleted, failed, "Bulk clear failed");
                // show what is actually left
                if let Err(e) = self.load().await {
                    warn!(error = %e, "Could not refresh records after failed clear");
                }
                self.notifier.notify(Notification::failure(CLEAR_FAILED_MESSAGE));
            }
            ClearOutcome::Cancelled => {}
        }

        outcome
    }
}

fn tally(results: Vec<(&str, Result<bool, StoreError>)>) -> ClearOutcome {
    let mut deleted = 0;
    let mut failed = 0;

    for (id, result) in results {
        match result {
            Ok(true) => deleted += 1,
            Ok(false) => debug!(id, "Record already gone"),
            Err(e) => {
                warn!(error = %e, id, "Record delete failed");
                failed += 1;
            }
        }
    }

    if failed == 0 {
        ClearOutcome::Cleared { deleted }
    } else {
        ClearOutcome::Failed { deleted, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::testing::{badge, service};
    use crate::store::RecordStore;

    async fn seeded(n: usize) -> (std::sync::Arc<crate::store::MemoryRecordStore>, AttendanceService) {
        let (store, service) = service();
        for i in 0..n {
            service
                .ingest(&badge(&format!("E{i}"), &format!("Empleado {i}")))
                .await
                .unwrap();
        }
        (store, service)
    }

    #[actix_web::test]
    async fn confirmed_clear_empties_store_and_board() {
        let (store, service) = seeded(3).await;

        let outcome = service.clear_all(Confirmation::Confirmed).await;

        assert_eq!(outcome, ClearOutcome::Cleared { deleted: 3 });
        assert!(service.records().await.is_empty());
        assert!(store.fetch_all().await.unwrap().is_empty());
        assert_eq!(
            service.notifier().latest(),
            Some(Notification::Cleared { deleted: 3 })
        );
    }

    #[actix_web::test]
    async fn cancelled_clear_changes_nothing() {
        let (store, service) = seeded(2).await;

        let outcome = service.clear_all(Confirmation::from(false)).await;

        assert_eq!(outcome, ClearOutcome::Cancelled);
        assert_eq!(store.len().await, 2);
        assert_eq!(service.records().await.len(), 2);
        assert!(service.cache().is_seen("E0").await);
    }

    #[actix_web::test]
    async fn employee_can_check_in_again_after_clear() {
        let (_store, service) = seeded(1).await;
        service.clear_all(Confirmation::Confirmed).await;

        let outcome = service.ingest(&badge("E0", "Empleado 0")).await.unwrap();
        assert!(matches!(
            outcome,
            crate::attendance::ingest::IngestOutcome::Recorded(_)
        ));
    }

    #[actix_web::test]
    async fn partial_failure_reports_once_and_resyncs_board() {
        let (store, service) = seeded(4).await;
        store.fail_deletes_after(1);
        let mut rx = service.notifier().subscribe();

        let outcome = service.clear_all(Confirmation::Confirmed).await;

        assert_eq!(outcome, ClearOutcome::Failed { deleted: 1, failed: 3 });
        assert_eq!(store.len().await, 3);
        assert_eq!(service.records().await.len(), 3);
        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::failure(CLEAR_FAILED_MESSAGE)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn records_already_gone_are_not_counted() {
        let outcome = tally(vec![
            ("a", Ok(true)),
            ("b", Ok(false)),
            ("c", Ok(true)),
        ]);
        assert_eq!(outcome, ClearOutcome::Cleared { deleted: 2 });

        let outcome = tally(vec![
            ("a", Ok(false)),
            ("b", Err(StoreError::Unavailable("down".to_string()))),
        ]);
        assert_eq!(outcome, ClearOutcome::Failed { deleted: 0, failed: 1 });
    }

    #[actix_web::test]
    async fn listing_failure_keeps_board() {
        let (store, service) = seeded(2).await;
        store.fail_reads(true);

        let outcome = service.clear_all(Confirmation::Confirmed).await;

        assert_eq!(outcome, ClearOutcome::Failed { deleted: 0, failed: 0 });
        assert_eq!(service.records().await.len(), 2);
        assert_eq!(store.len().await, 2);
    }
}
