use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::attendance::AttendanceService;
use crate::attendance::ingest::IngestOutcome;
use crate::attendance::notify::Notification;
use crate::scanner::zoom::TouchPoint;
use crate::scanner::{ScanError, ScannerController, TouchPhase, ZoomStatus};

#[derive(Serialize, ToSchema)]
pub struct ScannerStatusResponse {
    pub scanning: bool,
    /// Zoom slider bounds; absent when the camera cannot zoom
    pub zoom: Option<ZoomStatus>,
    /// Latest check-in notification for the operator
    pub notification: Option<Notification>,
}

#[derive(Deserialize, ToSchema)]
pub struct ZoomRequest {
    #[schema(example = 2.5)]
    pub value: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct TouchRequest {
    pub phase: TouchPhase,
    #[serde(default)]
    pub touches: Vec<TouchPoint>,
}

fn scan_error_response(e: ScanError) -> HttpResponse {
    match e {
        ScanError::AlreadyScanning => HttpResponse::Conflict().json(json!({
            "message": "Scanner is already running"
        })),
        ScanError::NotScanning => HttpResponse::Conflict().json(json!({
            "message": "No active scan session"
        })),
        ScanError::Camera(e) => HttpResponse::ServiceUnavailable().json(json!({
            "message": "Camera unavailable",
            "details": e.to_string()
        })),
    }
}

/// Scanner state for the operator screen
#[utoipa::path(
    get,
    path = "/api/scanner",
    responses(
        (status = 200, description = "Scanner state", body = ScannerStatusResponse)
    ),
    tag = "Scanner"
)]
pub async fn scanner_status(
    scanner: web::Data<ScannerController>,
    service: web::Data<AttendanceService>,
) -> impl Responder {
    let status = scanner.status().await;
    HttpResponse::Ok().json(ScannerStatusResponse {
        scanning: status.scanning,
        zoom: status.zoom,
        notification: service.notifier().latest(),
    })
}

/// Open the camera and check in the first badge it reads
#[utoipa::path(
    post,
    path = "/api/scanner/start",
    responses(
        (status = 202, description = "Scanning", body = Object, example = json!({
            "message": "Scanning",
            "session": 3
        })),
        (status = 409, description = "Scanner is already running"),
        (status = 503, description = "Camera unavailable")
    ),
    tag = "Scanner"
)]
pub async fn start_scanner(
    scanner: web::Data<ScannerController>,
    service: web::Data<AttendanceService>,
) -> impl Responder {
    let handle = match scanner.start().await {
        Ok(h) => h,
        Err(e) => return scan_error_response(e),
    };
    let session = handle.session();

    actix_web::rt::spawn(async move {
        let Some(text) = handle.decoded().await else {
            info!(session, "Scan session ended without a code");
            return;
        };

        match service.ingest(&text).await {
            Ok(IngestOutcome::Recorded(record)) => {
                info!(session, numero_empleado = %record.numero_empleado, "Scanned check-in recorded")
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, session, "Scanned check-in failed"),
        }
    });

    HttpResponse::Accepted().json(json!({
        "message": "Scanning",
        "session": session
    }))
}

/// Stop scanning and release the camera
#[utoipa::path(
    post,
    path = "/api/scanner/stop",
    responses(
        (status = 200, description = "Scanner stopped", body = Object, example = json!({
            "stopped": true
        }))
    ),
    tag = "Scanner"
)]
pub async fn stop_scanner(scanner: web::Data<ScannerController>) -> impl Responder {
    let stopped = scanner.stop().await;
    HttpResponse::Ok().json(json!({ "stopped": stopped }))
}

/// Set the camera zoom, clamped to the camera's range
#[utoipa::path(
    put,
    path = "/api/scanner/zoom",
    request_body = ZoomRequest,
    responses(
        (status = 200, description = "Zoom applied", body = Object, example = json!({
            "zoom": 2.5
        })),
        (status = 409, description = "No active scan session")
    ),
    tag = "Scanner"
)]
pub async fn set_zoom(
    scanner: web::Data<ScannerController>,
    body: web::Json<ZoomRequest>,
) -> impl Responder {
    match scanner.set_zoom(body.value).await {
        Ok(zoom) => HttpResponse::Ok().json(json!({ "zoom": zoom })),
        Err(e) => scan_error_response(e),
    }
}

/// Pinch-to-zoom touch events from the preview
#[utoipa::path(
    post,
    path = "/api/scanner/touch",
    request_body = TouchRequest,
    responses(
        (status = 200, description = "Touch handled; zoom is set on a pinch move", body = Object, example = json!({
            "zoom": 3.0
        })),
        (status = 409, description = "No active scan session")
    ),
    tag = "Scanner"
)]
pub async fn touch(
    scanner: web::Data<ScannerController>,
    body: web::Json<TouchRequest>,
) -> impl Responder {
    match scanner.touch(body.phase, &body.touches).await {
        Ok(zoom) => HttpResponse::Ok().json(json!({ "zoom": zoom })),
        Err(e) => scan_error_response(e),
    }
}
