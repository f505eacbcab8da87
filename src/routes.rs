use crate::{
    api::{attendance, scanner},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("rate limit settings must be non-zero");
        Governor::new(&cfg)
    }

    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));
    let clear_limiter = Arc::new(build_limiter(config.rate_clear_per_min));
    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter)
            .service(
                web::scope("/attendance")
                    // DELETE /attendance?confirm=true
                    .service(
                        web::resource("")
                            .guard(guard::Delete())
                            .wrap(clear_limiter)
                            .route(web::delete().to(attendance::clear_records)),
                    )
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_records)))
                    // /attendance/scan
                    .service(
                        web::resource("/scan")
                            .wrap(scan_limiter.clone())
                            .route(web::post().to(attendance::scan_badge)),
                    )
                    // /attendance/export
                    .service(
                        web::resource("/export").route(web::get().to(attendance::export_records)),
                    ),
            )
            .service(
                web::scope("/scanner")
                    // /scanner
                    .service(web::resource("").route(web::get().to(scanner::scanner_status)))
                    // /scanner/start
                    .service(
                        web::resource("/start")
                            .wrap(scan_limiter)
                            .route(web::post().to(scanner::start_scanner)),
                    )
                    .service(web::resource("/stop").route(web::post().to(scanner::stop_scanner)))
                    .service(web::resource("/zoom").route(web::put().to(scanner::set_zoom)))
                    .service(web::resource("/touch").route(web::post().to(scanner::touch))),
            ),
    );
}
