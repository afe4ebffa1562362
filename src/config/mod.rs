//! Daemon configuration.
//!
//! Priority: CLI / env var  >  `{data_dir}/config.toml`  >  built-in default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4310;
const DEFAULT_BLOB_BASE_URL: &str = "https://blob.vercel-storage.com";
const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── StorageConfig ────────────────────────────────────────────────────────────

/// Where the record files live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Blob-service HTTP store; requires a write token.
    Remote,
    /// Files under the data directory. Development and tests.
    Local,
}

/// Record storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Base URL of the remote blob service.
    pub base_url: String,
    /// Write token for the remote blob service (`BLOB_READ_WRITE_TOKEN`).
    /// None with the remote backend puts the daemon in storage-unconfigured
    /// mode: it serves, but every record request answers 503 with guidance.
    pub token: Option<String>,
}

// ─── AuthConfig ───────────────────────────────────────────────────────────────

/// Login/session configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for session tokens (`CAMPSCORED_JWT_SECRET`).
    pub jwt_secret: String,
}

// ─── DaemonConfig ─────────────────────────────────────────────────────────────

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    pub log_format: String,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 4310).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,campscored=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    log_format: Option<String>,
    /// Storage backend: "remote" (default) | "local".
    storage_backend: Option<StorageBackend>,
    /// Base URL of the remote blob service.
    blob_base_url: Option<String>,
    /// Write token for the remote blob service. Env var wins.
    blob_token: Option<String>,
    /// HS256 secret for session tokens. Env var wins.
    jwt_secret: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl DaemonConfig {
    /// Resolve the configuration from CLI overrides, env vars, the TOML
    /// file, and defaults, in that priority order.
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());
        let log_format = toml.log_format.unwrap_or_else(|| "pretty".to_string());

        let bind_address = bind_address
            .or_else(|| env_var("CAMPSCORED_BIND"))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let storage = StorageConfig {
            backend: toml.storage_backend.unwrap_or(StorageBackend::Remote),
            base_url: env_var("CAMPSCORED_BLOB_URL")
                .or(toml.blob_base_url)
                .unwrap_or_else(|| DEFAULT_BLOB_BASE_URL.to_string()),
            token: env_var("BLOB_READ_WRITE_TOKEN").or(toml.blob_token),
        };

        let auth = AuthConfig {
            jwt_secret: env_var("CAMPSCORED_JWT_SECRET")
                .or(toml.jwt_secret)
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
        };

        Self {
            port,
            bind_address,
            data_dir,
            log,
            log_format,
            storage,
            auth,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("campscored");
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("campscored");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("campscored");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("campscored");
        }
    }
    PathBuf::from(".campscored")
}
