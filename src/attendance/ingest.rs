use chrono::Local;
use tracing::{error, info, warn};

use super::AttendanceService;
use super::notify::{CHECKIN_FAILED_MESSAGE, Notification};
use crate::model::attendance::AttendanceRecord;
use crate::model::payload::{PayloadError, ScanPayload};
use crate::store::StoreError;

/// Capture time as shown to operators and written to the export.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Recorded(AttendanceRecord),
    /// The employee already has a check-in; nothing was written.
    Duplicate(String),
    /// The scanned text is not a badge payload; nothing was written.
    Rejected(PayloadError),
}

pub fn capture_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

impl AttendanceService {
    /// Check in the employee encoded in a decoded QR text.
    ///
    /// The duplicate check and the insert are two separate store calls, so
    /// two scanners racing on the same badge can both insert.
    pub async fn ingest(&self, raw: &str) -> Result<IngestOutcome, StoreError> {
        let payload = match ScanPayload::parse(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Scanned code is not a badge payload");
                return Ok(IngestOutcome::Rejected(e));
            }
        };
        let numero = payload.numero_empleado.clone();

        if self.cache.is_seen(&numero).await {
            info!(numero_empleado = %numero, "Duplicate check-in (cached)");
            self.notifier.notify(Notification::duplicate(&numero));
            return Ok(IngestOutcome::Duplicate(numero));
        }

        let existing = self.store.find_by_employee(&numero).await.map_err(|e| {
            error!(error = %e, numero_empleado = %numero, "Duplicate lookup failed");
            self.notifier.notify(Notification::failure(CHECKIN_FAILED_MESSAGE));
            e
        })?;

        if existing.is_some() {
            info!(numero_empleado = %numero, "Duplicate check-in");
            self.cache.mark_seen(&numero).await;
            self.notifier.notify(Notification::duplicate(&numero));
            return Ok(IngestOutcome::Duplicate(numero));
        }

        let record = AttendanceRecord::from_payload(payload, capture_timestamp());

        self.store.insert(&record).await.map_err(|e| {
            error!(error = %e, numero_empleado = %numero, "Check-in insert failed");
            self.notifier.notify(Notification::failure(CHECKIN_FAILED_MESSAGE));
            e
        })?;

        self.cache.mark_seen(&numero).await;
        self.board.write().await.push(record.clone());

        info!(numero_empleado = %numero, id = %record.id, "Checked in");
        self.notifier.notify(Notification::Recorded {
            numero_empleado: numero,
            nombre: record.nombre.clone(),
        });

        Ok(IngestOutcome::Recorded(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::testing::{ANA, badge, service};
    use crate::store::RecordStore;
    use std::sync::atomic::Ordering;

    #[actix_web::test]
    async fn records_new_badge_with_timestamp() {
        let (store, service) = service();

        let record = match service.ingest(ANA).await.unwrap() {
            IngestOutcome::Recorded(record) => record,
            other => panic!("expected a recorded check-in, got {other:?}"),
        };

        assert_eq!(record.nombre, "Ana Diaz");
        assert_eq!(record.puesto, "Operator");
        assert_eq!(record.unidad, "Line1");
        assert_eq!(record.udn, "UDN1");
        assert_eq!(record.numero_empleado, "E100");
        assert!(!record.timestamp.is_empty());

        let stored = store.find_by_employee("E100").await.unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(service.records().await, vec![record]);
    }

    #[actix_web::test]
    async fn second_scan_of_same_employee_is_a_duplicate() {
        let (store, service) = service();
        let mut rx = service.notifier().subscribe();

        service.ingest(ANA).await.unwrap();
        let again = service.ingest(ANA).await.unwrap();

        assert_eq!(again, IngestOutcome::Duplicate("E100".to_string()));
        assert_eq!(store.count_employee("E100").await, 1);
        assert_eq!(service.records().await.len(), 1);

        assert!(matches!(rx.recv().await.unwrap(), Notification::Recorded { .. }));
        assert_eq!(rx.recv().await.unwrap(), Notification::duplicate("E100"));
    }

    #[actix_web::test]
    async fn duplicate_found_in_store_when_cache_is_cold() {
        let (store, service) = service();
        service.ingest(&badge("E7", "Luis")).await.unwrap();
        service.cache().invalidate_all();

        let outcome = service.ingest(&badge("E7", "Luis Again")).await.unwrap();

        assert_eq!(outcome, IngestOutcome::Duplicate("E7".to_string()));
        assert_eq!(store.count_employee("E7").await, 1);
        assert!(service.cache().is_seen("E7").await);
    }

    #[actix_web::test]
    async fn malformed_payload_never_writes() {
        let (store, service) = service();

        for raw in ["", "hola", "{\"nombre\":\"Ana\"}", "[]", "{\"numeroEmpleado\":{}}"] {
            let outcome = service.ingest(raw).await.unwrap();
            assert!(matches!(outcome, IngestOutcome::Rejected(_)), "{raw:?}");
            assert_eq!(outcome.clone(), outcome);
        }

        assert_eq!(store.insert_calls.load(Ordering::Relaxed), 0);
        assert_eq!(store.query_calls.load(Ordering::Relaxed), 0);
        assert!(service.records().await.is_empty());
    }

    #[actix_web::test]
    async fn store_failure_is_reported_and_nothing_is_added() {
        let (store, service) = service();
        let mut rx = service.notifier().subscribe();
        store.fail_writes(true);

        let result = service.ingest(ANA).await;

        assert!(result.is_err());
        assert!(service.records().await.is_empty());
        assert!(!service.cache().is_seen("E100").await);
        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::failure(CHECKIN_FAILED_MESSAGE)
        );
    }

    #[actix_web::test]
    async fn lookup_failure_aborts_before_insert() {
        let (store, service) = service();
        store.fail_reads(true);

        assert!(service.ingest(ANA).await.is_err());
        assert_eq!(store.insert_calls.load(Ordering::Relaxed), 0);
    }
}
