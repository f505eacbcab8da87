use rust_xlsxwriter::{Format, Workbook, XlsxError};
use strum::IntoEnumIterator;
use strum_macros::{EnumCount, EnumIter, IntoStaticStr};
use tracing::info;

use super::AttendanceService;
use crate::model::attendance::AttendanceRecord;

pub const SHEET_NAME: &str = "Asistencia";
pub const FILE_NAME: &str = "asistencia.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Export columns, in sheet order. The string form is the header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumCount, IntoStaticStr)]
pub enum ExportColumn {
    #[strum(serialize = "Nombre completo")]
    Nombre,
    #[strum(serialize = "Puesto")]
    Puesto,
    #[strum(serialize = "Área")]
    Unidad,
    #[strum(serialize = "Unidad de negocio")]
    Udn,
    #[strum(serialize = "Número de empleado")]
    NumeroEmpleado,
    #[strum(serialize = "Fecha y hora de registro")]
    Timestamp,
}

impl ExportColumn {
    pub fn header(self) -> &'static str {
        self.into()
    }

    pub fn value(self, record: &AttendanceRecord) -> &str {
        match self {
            Self::Nombre => &record.nombre,
            Self::Puesto => &record.puesto,
            Self::Unidad => &record.unidad,
            Self::Udn => &record.udn,
            Self::NumeroEmpleado => &record.numero_empleado,
            Self::Timestamp => &record.timestamp,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("spreadsheet generation failed: {0}")]
    Xlsx(#[from] XlsxError),
}

pub fn headers() -> Vec<&'static str> {
    ExportColumn::iter().map(ExportColumn::header).collect()
}

/// One row per record, cells in `ExportColumn` order.
pub fn to_rows(records: &[AttendanceRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| ExportColumn::iter().map(|c| c.value(r).to_string()).collect())
        .collect()
}

/// Serialize rows under the header line into a single-sheet workbook.
pub fn write_workbook(rows: &[Vec<String>]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in headers().into_iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &bold)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_idx = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string(row_idx, col as u16, cell)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

impl AttendanceService {
    /// Workbook bytes for everything currently on the board.
    pub async fn export_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let rows = to_rows(&self.records().await);
        let bytes = write_workbook(&rows)?;
        info!(rows = rows.len(), bytes = bytes.len(), "Attendance exported");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::testing::{ANA, badge, service};
    use crate::model::payload::ScanPayload;
    use strum::EnumCount;

    fn record(raw: &str, ts: &str) -> AttendanceRecord {
        AttendanceRecord::from_payload(ScanPayload::parse(raw).unwrap(), ts.to_string())
    }

    #[test]
    fn header_order_is_fixed() {
        assert_eq!(
            headers(),
            vec![
                "Nombre completo",
                "Puesto",
                "Área",
                "Unidad de negocio",
                "Número de empleado",
                "Fecha y hora de registro",
            ]
        );
        assert_eq!(ExportColumn::COUNT, 6);
    }

    #[test]
    fn rows_follow_header_order() {
        let records = vec![
            record(ANA, "17/10/2026, 08:00:00"),
            record(r#"{"cargo":"Jefe","numeroEmpleado":"E2","extra":"x"}"#, "t2"),
        ];

        let rows = to_rows(&records);

        assert_eq!(
            rows,
            vec![
                vec!["Ana Diaz", "Operator", "Line1", "UDN1", "E100", "17/10/2026, 08:00:00"],
                vec!["", "Jefe", "", "", "E2", "t2"],
            ]
        );
    }

    #[test]
    fn workbook_is_a_zip_container() {
        let bytes = write_workbook(&to_rows(&[record(ANA, "t")])).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let empty = write_workbook(&[]).unwrap();
        assert!(empty.starts_with(b"PK"));
    }

    #[actix_web::test]
    async fn export_reads_the_board_not_the_store() {
        let (store, service) = service();
        service.ingest(&badge("E1", "Ana")).await.unwrap();
        store.fail_reads(true);

        let bytes = service.export_xlsx().await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
