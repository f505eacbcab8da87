use std::env;
use std::str::FromStr;
use dotenvy::dotenv;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    /// records live only as long as the process
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_clear_per_min: u32,
    pub rate_api_per_min: u32,

    // Scanner
    pub scan_fps: u32,
    pub scan_box_size: u32,
    pub scan_spool_dir: String,

    // Check-in cache
    pub checkin_cache_ttl_secs: u64,
    pub checkin_cache_capacity: u64,
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok(), default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            _ => StoreBackend::MySql,
        };

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            store_backend,
            database_url: match store_backend {
                StoreBackend::MySql => env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
            },
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_scan_per_min: var_or("RATE_SCAN_PER_MIN", 120),
            rate_clear_per_min: var_or("RATE_CLEAR_PER_MIN", 6),
            rate_api_per_min: var_or("RATE_API_PER_MIN", 1000),

            scan_fps: var_or("SCAN_FPS", 10),
            scan_box_size: var_or("SCAN_BOX_SIZE", 250),
            scan_spool_dir: env::var("SCAN_SPOOL_DIR").unwrap_or_else(|_| "scans".to_string()),

            checkin_cache_ttl_secs: var_or("CHECKIN_CACHE_TTL_SECS", 86400), // 24h
            checkin_cache_capacity: var_or("CHECKIN_CACHE_CAPACITY", 100_000),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            store_backend: StoreBackend::Memory,
            database_url: String::new(),
            api_prefix: "/api".to_string(),
            rate_scan_per_min: 10_000,
            rate_clear_per_min: 10_000,
            rate_api_per_min: 10_000,
            scan_fps: 200,
            scan_box_size: 250,
            scan_spool_dir: "scans".to_string(),
            checkin_cache_ttl_secs: 60,
            checkin_cache_capacity: 1_000,
        }
    }
}
