use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use super::{RecordStore, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceRow};

const SELECT_COLUMNS: &str =
    "SELECT id, nombre, puesto, unidad, udn, numero_empleado, captured_at, extra FROM attendance_records";

pub struct MySqlRecordStore {
    pool: MySqlPool,
}

impl MySqlRecordStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    fn backend_tag(&self) -> &'static str {
        "mysql"
    }

    async fn insert(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let extra = if record.extra.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(record.extra.clone()).to_string())
        };

        sqlx::query(
            r#"
            INSERT INTO attendance_records
            (id, nombre, puesto, unidad, udn, numero_empleado, captured_at, extra)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.nombre)
        .bind(&record.puesto)
        .bind(&record.unidad)
        .bind(&record.udn)
        .bind(&record.numero_empleado)
        .bind(&record.timestamp)
        .bind(extra)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY seq ASC");
        debug!(sql = %sql, "Fetching attendance records");

        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn find_by_employee(
        &self,
        numero_empleado: &str,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} WHERE numero_empleado = ? LIMIT 1");

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(numero_empleado)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(AttendanceRecord::from))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
