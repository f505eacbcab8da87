use crate::api::attendance::{ClearQuery, ScanRequest};
use crate::api::scanner::{ScannerStatusResponse, TouchRequest, ZoomRequest};
use crate::attendance::notify::Notification;
use crate::scanner::zoom::TouchPoint;
use crate::scanner::{TouchPhase, ZoomStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asistencia API",
        version = "0.1.0",
        description = r#"
## Attendance check-in by badge QR code

Each employee badge carries a QR code with the employee's name, position,
area, business unit and employee number.

### 🔹 Key Features
- **Check-in**
  - Scan a badge (camera or decoded text); one check-in per employee number
- **Export**
  - Download every check-in as `asistencia.xlsx`
- **Clear**
  - Delete every record, after explicit confirmation
- **Scanner**
  - Start/stop the camera, zoom slider and pinch-to-zoom

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::list_records,
        crate::api::attendance::scan_badge,
        crate::api::attendance::export_records,
        crate::api::attendance::clear_records,

        crate::api::scanner::scanner_status,
        crate::api::scanner::start_scanner,
        crate::api::scanner::stop_scanner,
        crate::api::scanner::set_zoom,
        crate::api::scanner::touch
    ),
    components(
        schemas(
            ScanRequest,
            ClearQuery,
            ScannerStatusResponse,
            ZoomStatus,
            ZoomRequest,
            TouchRequest,
            TouchPhase,
            TouchPoint,
            Notification
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in, export and clear APIs"),
        (name = "Scanner", description = "Camera scanner control APIs"),
    )
)]
pub struct ApiDoc;
