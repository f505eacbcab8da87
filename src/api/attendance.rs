use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::AttendanceService;
use crate::attendance::clear::{ClearOutcome, Confirmation};
use crate::attendance::export::{FILE_NAME, XLSX_CONTENT_TYPE};
use crate::attendance::ingest::IngestOutcome;
use crate::attendance::notify::{CHECKIN_FAILED_MESSAGE, CLEAR_FAILED_MESSAGE, DUPLICATE_MESSAGE};

#[derive(Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Text decoded from the badge QR code
    #[schema(
        example = r#"{"nombre":"Ana Diaz","puesto":"Operator","unidad":"Line1","udn":"UDN1","numeroEmpleado":"E100"}"#
    )]
    pub payload: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ClearQuery {
    /// Must be `true` to delete every record
    #[schema(example = true)]
    pub confirm: Option<bool>,
}

/// List checked-in employees
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "Records on the board, oldest first", body = Object, example = json!({
            "data": [{
                "id": "5b3c0a7e-2f4d-4a39-9c1e-0d8f6a2b7c11",
                "nombre": "Ana Diaz",
                "puesto": "Operator",
                "unidad": "Line1",
                "udn": "UDN1",
                "numeroEmpleado": "E100",
                "timestamp": "17/10/2026, 08:02:11"
            }],
            "total": 1
        }))
    ),
    tag = "Attendance"
)]
pub async fn list_records(service: web::Data<AttendanceService>) -> impl Responder {
    let records = service.records().await;
    let total = records.len();
    HttpResponse::Ok().json(json!({
        "data": records,
        "total": total
    }))
}

/// Check in a scanned badge
#[utoipa::path(
    post,
    path = "/api/attendance/scan",
    request_body = ScanRequest,
    responses(
        (status = 201, description = "Checked in", body = Object),
        (status = 400, description = "Not a badge payload", body = Object, example = json!({
            "message": "Invalid badge payload",
            "details": "missing required field `numeroEmpleado`"
        })),
        (status = 409, description = "Employee already checked in", body = Object, example = json!({
            "message": "Este número de empleado ya ha sido registrado.",
            "numeroEmpleado": "E100"
        })),
        (status = 500, description = "Record store failure", body = Object, example = json!({
            "message": "No se pudo registrar la asistencia."
        }))
    ),
    tag = "Attendance"
)]
pub async fn scan_badge(
    service: web::Data<AttendanceService>,
    body: web::Json<ScanRequest>,
) -> impl Responder {
    match service.ingest(&body.payload).await {
        Ok(IngestOutcome::Recorded(record)) => HttpResponse::Created().json(record),
        Ok(IngestOutcome::Duplicate(numero)) => HttpResponse::Conflict().json(json!({
            "message": DUPLICATE_MESSAGE,
            "numeroEmpleado": numero
        })),
        Ok(IngestOutcome::Rejected(e)) => HttpResponse::BadRequest().json(json!({
            "message": "Invalid badge payload",
            "details": e.to_string()
        })),
        Err(_) => HttpResponse::InternalServerError().json(json!({
            "message": CHECKIN_FAILED_MESSAGE
        })),
    }
}

/// Download the board as `asistencia.xlsx`
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    responses(
        (status = 200, description = "xlsx workbook with one sheet named Asistencia"),
        (status = 500, description = "Spreadsheet generation failed")
    ),
    tag = "Attendance"
)]
pub async fn export_records(
    service: web::Data<AttendanceService>,
) -> actix_web::Result<impl Responder> {
    let bytes = service.export_xlsx().await.map_err(|e| {
        error!(error = %e, "Export failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{FILE_NAME}\""),
        ))
        .body(bytes))
}

/// Delete every attendance record
#[utoipa::path(
    delete,
    path = "/api/attendance",
    params(ClearQuery),
    responses(
        (status = 200, description = "All records deleted", body = Object, example = json!({
            "message": "Attendance records cleared",
            "deleted": 12
        })),
        (status = 400, description = "Not confirmed, nothing deleted", body = Object, example = json!({
            "message": "Confirmation required: pass confirm=true"
        })),
        (status = 500, description = "Some or all deletes failed", body = Object, example = json!({
            "message": "No se pudieron eliminar los registros."
        }))
    ),
    tag = "Attendance"
)]
pub async fn clear_records(
    service: web::Data<AttendanceService>,
    query: web::Query<ClearQuery>,
) -> impl Responder {
    let confirmation = Confirmation::from(query.confirm.unwrap_or(false));

    match service.clear_all(confirmation).await {
        ClearOutcome::Cancelled => HttpResponse::BadRequest().json(json!({
            "message": "Confirmation required: pass confirm=true"
        })),
        ClearOutcome::Cleared { deleted } => HttpResponse::Ok().json(json!({
            "message": "Attendance records cleared",
            "deleted": deleted
        })),
        ClearOutcome::Failed { .. } => HttpResponse::InternalServerError().json(json!({
            "message": CLEAR_FAILED_MESSAGE
        })),
    }
}
