use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Bound on editor load and submit round-trips.
    pub store_timeout: Duration,
    /// Editor sessions untouched for this long are dropped.
    pub session_idle_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        };
        let database_url = match store_backend {
            StoreBackend::Postgres => env::var("DATABASE_URL")?,
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };
        let jwt_secret = env::var("JWT_SECRET")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/uploads"));
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(5 * 1024 * 1024);
        let store_timeout = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(15)
            .clamp(10, 30);
        let session_idle_ttl = env::var("EDITOR_SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30 * 60)
            .max(60);
        Ok(Self {
            database_url,
            store_backend,
            host,
            port,
            jwt_secret,
            upload_dir,
            max_upload_bytes,
            store_timeout: Duration::from_secs(store_timeout),
            session_idle_ttl: Duration::from_secs(session_idle_ttl),
        })
    }
}
