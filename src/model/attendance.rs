use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::payload::ScanPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// document id assigned when the record is created
    pub id: String,
    pub nombre: String,
    #[serde(alias = "cargo")]
    pub puesto: String,
    pub unidad: String,
    pub udn: String,
    #[serde(rename = "numeroEmpleado")]
    pub numero_empleado: String,
    /// capture time, formatted on the scanning side
    pub timestamp: String,
    /// fields of the scanned payload this service does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttendanceRecord {
    pub fn from_payload(payload: ScanPayload, timestamp: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nombre: payload.nombre,
            puesto: payload.puesto,
            unidad: payload.unidad,
            udn: payload.udn,
            numero_empleado: payload.numero_empleado,
            timestamp,
            extra: payload.extra,
        }
    }
}

/// Row shape of the `attendance_records` table.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: String,
    pub nombre: String,
    pub puesto: String,
    pub unidad: String,
    pub udn: String,
    pub numero_empleado: String,
    pub captured_at: String,
    pub extra: Option<String>,
}

impl From<AttendanceRow> for AttendanceRecord {
    fn from(row: AttendanceRow) -> Self {
        let extra = row
            .extra
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Map<String, Value>>(raw).ok())
            .unwrap_or_default();

        Self {
            id: row.id,
            nombre: row.nombre,
            puesto: row.puesto,
            unidad: row.unidad,
            udn: row.udn,
            numero_empleado: row.numero_empleado,
            timestamp: row.captured_at,
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_payload_field_names() {
        let payload = ScanPayload::parse(
            r#"{"nombre":"Ana Diaz","puesto":"Operator","unidad":"Line1","udn":"UDN1","numeroEmpleado":"E100","turno":"A"}"#,
        )
        .unwrap();
        let record = AttendanceRecord::from_payload(payload, "17/10/2026, 08:00:00".into());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["numeroEmpleado"], json!("E100"));
        assert_eq!(value["turno"], json!("A"));
        assert_eq!(value["timestamp"], json!("17/10/2026, 08:00:00"));
        assert!(!record.id.is_empty());
    }

    #[test]
    fn serialized_record_keeps_its_own_id_and_timestamp() {
        let payload =
            ScanPayload::parse(r#"{"numeroEmpleado":"E1","timestamp":"forged","id":"x"}"#).unwrap();
        let record = AttendanceRecord::from_payload(payload, "17/10/2026, 08:00:00".into());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json.matches("\"timestamp\"").count(), 1);
        assert_eq!(json.matches("\"id\"").count(), 1);

        let back: AttendanceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, "17/10/2026, 08:00:00");
        assert_eq!(back.id, record.id);
    }

    #[test]
    fn row_with_broken_extra_json_yields_empty_extra() {
        let row = AttendanceRow {
            id: "1".into(),
            nombre: "Ana".into(),
            puesto: "Operator".into(),
            unidad: "Line1".into(),
            udn: "UDN1".into(),
            numero_empleado: "E100".into(),
            captured_at: "now".into(),
            extra: Some("{not json".into()),
        };

        let record = AttendanceRecord::from(row);
        assert!(record.extra.is_empty());
        assert_eq!(record.timestamp, "now");
    }
}
