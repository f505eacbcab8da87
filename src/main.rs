use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod attendance;
mod config;
mod db;
mod docs;
mod model;
mod routes;
mod scanner;
mod store;
mod utils;

use attendance::AttendanceService;
use attendance::notify::Notifier;
use config::{Config, StoreBackend};
use db::{ensure_schema, init_db};
use scanner::qr::RqrrDecoder;
use scanner::spool::SpoolCameraProvider;
use scanner::{ScanSettings, ScannerController};
use store::{MemoryRecordStore, MySqlRecordStore, RecordStore};
use utils::checkin_cache::CheckinCache;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Registro de Asistencia"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::MySql => {
            let pool = init_db(&config.database_url).await;
            ensure_schema(&pool)
                .await
                .map_err(|e| std::io::Error::other(format!("schema setup failed: {e}")))?;
            Arc::new(MySqlRecordStore::new(pool))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory record store; records are lost on restart");
            Arc::new(MemoryRecordStore::new())
        }
    };

    let service = Data::new(AttendanceService::new(
        store,
        CheckinCache::new(
            config.checkin_cache_capacity,
            Duration::from_secs(config.checkin_cache_ttl_secs),
        ),
        Notifier::new(64),
    ));

    match service.load().await {
        Ok(count) => info!(count, "Attendance board loaded"),
        Err(e) => warn!(error = %e, "Attendance board could not be loaded"),
    }

    let service_for_warmup = service.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = service_for_warmup
            .cache()
            .warmup(service_for_warmup.store(), 500)
            .await
        {
            warn!(error = %e, "Failed to warmup check-in cache");
        }
    });

    let scanner = Data::new(ScannerController::new(
        Arc::new(SpoolCameraProvider::new(&config.scan_spool_dir)),
        Arc::new(RqrrDecoder),
        ScanSettings {
            fps: config.scan_fps,
            box_size: config.scan_box_size,
        },
    ));

    let server_addr = config.server_addr.clone();
    let scanner_for_shutdown = scanner.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .app_data(scanner.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    scanner_for_shutdown.shutdown().await;
    info!("Server stopped");
    Ok(())
}
