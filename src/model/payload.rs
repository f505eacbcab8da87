use serde_json::{Map, Value};
use tracing::debug;

/// Why a decoded QR text was not accepted as a check-in payload.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    NotJson(String),

    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    WrongType(&'static str),
}

/// A validated check-in payload as encoded in the employee badge QR.
///
/// `numeroEmpleado` is the only required field. The descriptive fields
/// default to empty strings, `cargo` is read as `puesto` when `puesto` is
/// absent, and every other key is carried in `extra` untouched. Keys the
/// record stamps itself (`id`, `timestamp`) are dropped so a badge cannot
/// shadow them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPayload {
    pub nombre: String,
    pub puesto: String,
    pub unidad: String,
    pub udn: String,
    pub numero_empleado: String,
    pub extra: Map<String, Value>,
}

const EMPLOYEE_NUMBER: &str = "numeroEmpleado";

/// Record fields assigned at capture time, never taken from the badge.
const STAMPED_FIELDS: [&str; 2] = ["id", "timestamp"];

impl ScanPayload {
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_str(raw.trim()).map_err(|e| PayloadError::NotJson(e.to_string()))?;

        let Value::Object(mut obj) = value else {
            return Err(PayloadError::NotAnObject);
        };

        let numero_empleado = match obj.remove(EMPLOYEE_NUMBER) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(PayloadError::MissingField(EMPLOYEE_NUMBER));
            }
            Some(_) => return Err(PayloadError::WrongType(EMPLOYEE_NUMBER)),
        };

        let nombre = take_string(&mut obj, "nombre")?;
        let puesto = take_string(&mut obj, "puesto")?;
        let cargo = take_string(&mut obj, "cargo")?;
        let puesto = if puesto.is_empty() { cargo } else { puesto };
        let unidad = take_string(&mut obj, "unidad")?;
        let udn = take_string(&mut obj, "udn")?;

        for field in STAMPED_FIELDS {
            if obj.remove(field).is_some() {
                debug!(field, "Ignoring stamped field carried by badge");
            }
        }

        Ok(Self {
            nombre,
            puesto,
            unidad,
            udn,
            numero_empleado,
            extra: obj,
        })
    }
}

fn take_string(obj: &mut Map<String, Value>, field: &'static str) -> Result<String, PayloadError> {
    match obj.remove(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(PayloadError::WrongType(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_badge() {
        let p = ScanPayload::parse(
            r#"{"nombre":"Ana Diaz","puesto":"Operator","unidad":"Line1","udn":"UDN1","numeroEmpleado":"E100"}"#,
        )
        .unwrap();

        assert_eq!(p.nombre, "Ana Diaz");
        assert_eq!(p.puesto, "Operator");
        assert_eq!(p.unidad, "Line1");
        assert_eq!(p.udn, "UDN1");
        assert_eq!(p.numero_empleado, "E100");
        assert!(p.extra.is_empty());
    }

    #[test]
    fn cargo_is_read_as_puesto() {
        let p = ScanPayload::parse(r#"{"cargo":"Supervisor","numeroEmpleado":"7"}"#).unwrap();
        assert_eq!(p.puesto, "Supervisor");
        assert!(!p.extra.contains_key("cargo"));
    }

    #[test]
    fn numeric_employee_number_is_stringified() {
        let p = ScanPayload::parse(r#"{"numeroEmpleado": 4521}"#).unwrap();
        assert_eq!(p.numero_empleado, "4521");
        assert_eq!(p.nombre, "");
    }

    #[test]
    fn unknown_fields_pass_through() {
        let p = ScanPayload::parse(r#"{"numeroEmpleado":"E1","turno":"noche","nivel":3}"#).unwrap();
        assert_eq!(p.extra.get("turno"), Some(&json!("noche")));
        assert_eq!(p.extra.get("nivel"), Some(&json!(3)));
    }

    #[test]
    fn badge_cannot_supply_stamped_fields() {
        let p = ScanPayload::parse(
            r#"{"numeroEmpleado":"E1","timestamp":"forged","id":"x","puesto":"Operator","cargo":"Jefe"}"#,
        )
        .unwrap();

        assert_eq!(p.puesto, "Operator");
        assert!(p.extra.is_empty());
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(
            ScanPayload::parse("not a badge"),
            Err(PayloadError::NotJson(_))
        ));
        assert_eq!(ScanPayload::parse("[1,2]"), Err(PayloadError::NotAnObject));
        assert_eq!(
            ScanPayload::parse(r#"{"nombre":"Ana"}"#),
            Err(PayloadError::MissingField("numeroEmpleado"))
        );
        assert_eq!(
            ScanPayload::parse(r#"{"numeroEmpleado":"   "}"#),
            Err(PayloadError::MissingField("numeroEmpleado"))
        );
        assert_eq!(
            ScanPayload::parse(r#"{"numeroEmpleado":"E1","nombre":42}"#),
            Err(PayloadError::WrongType("nombre"))
        );
        assert_eq!(
            ScanPayload::parse(r#"{"numeroEmpleado":true}"#),
            Err(PayloadError::WrongType("numeroEmpleado"))
        );
    }
}
