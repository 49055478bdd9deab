use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Endpoint used when `SUMMARIZER_URL` is not provided.
pub const DEFAULT_SUMMARIZER_URL: &str = "https://api.predibase.com/summarize";
const DEFAULT_STORAGE_DIR: &str = "./storage";
const DEFAULT_DATABASE_PATH: &str = "./filesum.db";
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the filesum server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Username accepted by every endpoint.
    pub username: String,
    /// Password accepted by every endpoint.
    pub password: String,
    /// Full URL of the remote summarization endpoint.
    pub summarizer_url: String,
    /// Bearer credential sent to the summarization endpoint.
    pub summarizer_api_key: String,
    /// Optional upper bound on a single summarization round-trip.
    pub summarizer_timeout: Option<Duration>,
    /// Directory holding raw uploaded bytes, one file per `file_id`.
    pub storage_dir: PathBuf,
    /// SQLite database file holding file metadata.
    pub database_path: PathBuf,
    /// Interface the HTTP server binds to.
    pub server_host: String,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that an empty line in `.env` falls back to the
    /// default instead of producing an unusable setting.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required =
            |key: &str| optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()));

        Ok(Self {
            username: required("FILESUM_USERNAME")?,
            password: required("FILESUM_PASSWORD")?,
            summarizer_url: optional("SUMMARIZER_URL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZER_URL.to_string()),
            summarizer_api_key: required("SUMMARIZER_API_KEY")?,
            summarizer_timeout: optional("SUMMARIZER_TIMEOUT_SECS")
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .map(Duration::from_secs)
                        .ok_or_else(|| ConfigError::InvalidValue("SUMMARIZER_TIMEOUT_SECS".into()))
                })
                .transpose()?,
            storage_dir: optional("STORAGE_DIR")
                .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string())
                .into(),
            database_path: optional("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            server_host: optional("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<(), ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        summarizer_url = %config.summarizer_url,
        storage_dir = %config.storage_dir.display(),
        database_path = %config.database_path.display(),
        server_port = config.server_port,
        "Loaded configuration"
    );
    // A second call keeps the first configuration.
    let _ = CONFIG.set(config);
    Ok(())
}
