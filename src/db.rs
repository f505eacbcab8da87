use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> MySqlPool {
    MySqlPool::connect(database_url)
        .await
        .expect("Failed to connect to database")
}

/// Create the records table when missing. Employee numbers are indexed but
/// not unique; the check-in workflow keeps them distinct.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_records (
            seq BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
            id CHAR(36) NOT NULL UNIQUE,
            nombre VARCHAR(255) NOT NULL,
            puesto VARCHAR(255) NOT NULL,
            unidad VARCHAR(255) NOT NULL,
            udn VARCHAR(255) NOT NULL,
            numero_empleado VARCHAR(64) NOT NULL,
            captured_at VARCHAR(64) NOT NULL,
            extra TEXT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            INDEX idx_attendance_numero_empleado (numero_empleado)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
