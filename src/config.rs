//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::form::{FormConfig, NumberLocale, RegistryConfig};
use crate::store::FirestoreConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub form: FormSettings,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Tariff dataset location
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// JSON dataset; the embedded list is used when unset
    pub path: Option<String>,
}

/// Form behaviour and session limits
#[derive(Debug, Clone, Deserialize)]
pub struct FormSettings {
    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_status_reset")]
    pub status_reset_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_session_idle")]
    pub session_idle_secs: u64,
}

fn default_locale() -> String {
    "es-CR".to_string()
}

fn default_status_reset() -> u64 {
    5
}

fn default_max_sessions() -> usize {
    500
}

fn default_session_idle() -> u64 {
    3600 // 1 hour
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            status_reset_secs: default_status_reset(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle(),
        }
    }
}

/// Which store receives submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
    Firestore,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Some(StoreBackend::Memory),
            "file" => Some(StoreBackend::File),
            "firestore" => Some(StoreBackend::Firestore),
            _ => None,
        }
    }
}

/// Price update store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_file_path")]
    pub file_path: String,

    #[serde(default)]
    pub firestore: FirestoreSettings,
}

fn default_backend() -> StoreBackend {
    StoreBackend::File
}

fn default_collection() -> String {
    "actualizaciones_precios".to_string()
}

fn default_file_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("tarifario")
                .join("actualizaciones_precios.jsonl")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./tarifario_data/actualizaciones_precios.jsonl".to_string())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            collection: default_collection(),
            file_path: default_file_path(),
            firestore: FirestoreSettings::default(),
        }
    }
}

/// Firestore connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreSettings {
    #[serde(default = "default_firestore_url")]
    pub base_url: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default = "default_database")]
    pub database: String,

    pub api_key: Option<String>,

    pub access_token: Option<String>,

    #[serde(default = "default_firestore_timeout")]
    pub request_timeout_ms: u64,
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_timeout() -> u64 {
    10_000
}

impl Default for FirestoreSettings {
    fn default() -> Self {
        Self {
            base_url: default_firestore_url(),
            project_id: String::new(),
            database: default_database(),
            api_key: None,
            access_token: None,
            request_timeout_ms: default_firestore_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("tarifario").join("config.toml")),
            Some(PathBuf::from("/etc/tarifario/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Server overrides
        if let Some(host) = var("TARIFARIO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("TARIFARIO_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Catalog overrides
        if let Some(path) = var("TARIFARIO_CATALOG") {
            self.catalog.path = Some(path);
        }

        // Store overrides
        if let Some(backend) = var("TARIFARIO_STORE_BACKEND") {
            match StoreBackend::parse(&backend) {
                Some(b) => self.store.backend = b,
                None => tracing::warn!(value = %backend, "Ignoring unknown store backend"),
            }
        }
        if let Some(path) = var("TARIFARIO_STORE_FILE") {
            self.store.file_path = path;
        }
        if let Some(project) = var("TARIFARIO_FIRESTORE_PROJECT") {
            self.store.firestore.project_id = project;
        }
        if let Some(key) = var("TARIFARIO_FIRESTORE_API_KEY") {
            self.store.firestore.api_key = Some(key);
        }
        if let Some(token) = var("TARIFARIO_FIRESTORE_TOKEN") {
            self.store.firestore.access_token = Some(token);
        }

        // Logging overrides
        if let Some(level) = var("TARIFARIO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("TARIFARIO_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Check settings that cannot be expressed through serde defaults
    pub fn validate(&self) -> Result<(), ConfigError> {
        if NumberLocale::from_tag(&self.form.locale).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unsupported locale '{}' (expected es-CR or en-US)",
                self.form.locale
            )));
        }
        if self.form.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "form.max_sessions must be at least 1".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Firestore
            && self.store.firestore.project_id.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "store.firestore.project_id is required for the firestore backend".to_string(),
            ));
        }
        Ok(())
    }

    pub fn form_config(&self) -> FormConfig {
        FormConfig {
            status_reset: Duration::from_secs(self.form.status_reset_secs),
            locale: NumberLocale::from_tag(&self.form.locale).unwrap_or_default(),
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            max_sessions: self.form.max_sessions,
            idle_timeout: Duration::from_secs(self.form.session_idle_secs),
        }
    }

    pub fn firestore_config(&self) -> FirestoreConfig {
        let fs = &self.store.firestore;
        FirestoreConfig {
            base_url: fs.base_url.clone(),
            project_id: fs.project_id.clone(),
            database: fs.database.clone(),
            collection: self.store.collection.clone(),
            api_key: fs.api_key.clone(),
            access_token: fs.access_token.clone(),
            request_timeout_ms: fs.request_timeout_ms,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Tarifario Configuration
#
# Environment variables override these settings:
# - TARIFARIO_HOST
# - TARIFARIO_PORT
# - TARIFARIO_CATALOG
# - TARIFARIO_STORE_BACKEND
# - TARIFARIO_STORE_FILE
# - TARIFARIO_FIRESTORE_PROJECT
# - TARIFARIO_FIRESTORE_API_KEY
# - TARIFARIO_FIRESTORE_TOKEN
# - TARIFARIO_LOG_LEVEL
# - TARIFARIO_LOG_FORMAT

[server]
# HTTP server host
host = "0.0.0.0"

# HTTP server port
port = 8080

# Allowed CORS origins (empty = same origin only)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[catalog]
# Tariff dataset (JSON). The built-in list is used when unset.
# path = "/etc/tarifario/tarifas.json"

[form]
# Number formatting for displayed prices: es-CR or en-US
locale = "es-CR"

# Seconds a success message stays visible
status_reset_secs = 5

# Maximum concurrent form sessions
max_sessions = 500

# Idle sessions are dropped after this many seconds
session_idle_secs = 3600

[store]
# Where submissions go: memory, file or firestore
backend = "file"

# Collection receiving one document per submission
collection = "actualizaciones_precios"

# JSON-lines file for the file backend
file_path = "~/.local/share/tarifario/actualizaciones_precios.jsonl"

[store.firestore]
# Google Cloud project id (required for the firestore backend)
project_id = ""

# Database id
database = "(default)"

# Web API key and/or OAuth2 access token
# api_key = ""
# access_token = ""

# Request timeout in milliseconds
request_timeout_ms = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
