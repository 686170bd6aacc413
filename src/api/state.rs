//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::PriceCatalog;
use crate::form::{FormRegistry, NumberLocale};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Form sessions (also owns the catalog and the store)
    pub registry: Arc<FormRegistry>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(registry: Arc<FormRegistry>, config: ApiConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    pub fn catalog(&self) -> &PriceCatalog {
        self.registry.catalog()
    }

    pub fn locale(&self) -> NumberLocale {
        self.registry.form_config().locale
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Origins allowed to call the JSON API cross-site
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Requests running longer than this are answered with 408
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            max_body_size: 64 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
