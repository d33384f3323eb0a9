//! Service configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible
//! defaults for development. In production, configure via environment
//! variables or a `.env` file.
//!
//! # Environment Switch
//!
//! `SERVICE_ENV=production` marks the production environment and disables
//! per-request logging. Any other value (or absence) selects development.
//!
//! # Admission Pipeline Tuning
//!
//! - `RATE_LIMIT_MAX_REQUESTS`: Admitted requests per window, shared by all
//!   clients (default: 100)
//! - `RATE_LIMIT_WINDOW_SECS`: Fixed window duration in seconds (default: 60)
//! - `HEALTH_PATH`: Liveness probe path answered before rate limiting
//!   (default: `/status`)

use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Deployment environment tag.
///
/// Parsed once at startup from `SERVICE_ENV`; only the exact value
/// `production` selects [`Environment::Production`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse the environment tag from its string form.
    ///
    /// Unknown values fall back to `Development`, mirroring the permissive
    /// behavior of the environment switch.
    pub fn from_str_lossy(value: &str) -> Self {
        if value == "production" {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Service configuration, immutable after load.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Deployment environment (default: development)
    pub environment: Environment,

    // =========================================================================
    // Admission Pipeline Configuration
    // =========================================================================
    /// Maximum requests admitted per window, across all clients combined.
    /// This is a global quota, not a per-client one.
    pub rate_limit_max_requests: u32,

    /// Duration of the fixed rate-limit window.
    pub rate_limit_window: Duration,

    /// Exact path answered by the liveness probe (default: "/status").
    /// Probe requests bypass the rate limiter entirely.
    pub health_path: String,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log filter (e.g., "info", "debug", "polygon_core=trace")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value is malformed or fails
    /// validation. Startup treats this as fatal.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            environment: Environment::from_str_lossy(
                &env::var("SERVICE_ENV").unwrap_or_default(),
            ),

            // Admission pipeline
            rate_limit_max_requests: Self::parse_env("RATE_LIMIT_MAX_REQUESTS", 100)?,
            rate_limit_window: Duration::from_secs(Self::parse_env(
                "RATE_LIMIT_WINDOW_SECS",
                60,
            )?),
            health_path: env::var("HEALTH_PATH").unwrap_or_else(|_| "/status".to_string()),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.rate_limit_max_requests == 0 {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_MAX_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_WINDOW_SECS must be greater than 0".to_string(),
            ));
        }

        if !self.health_path.starts_with('/') {
            return Err(AppError::ConfigError(format!(
                "HEALTH_PATH must start with '/': {}",
                self.health_path
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if per-request logging is enabled.
    ///
    /// Request logging is included in the chain only outside production.
    pub fn request_logging_enabled(&self) -> bool {
        self.environment != Environment::Production
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Development,
            rate_limit_max_requests: 100,
            rate_limit_window: Duration::from_secs(60),
            health_path: "/status".to_string(),
            log_level: "info".to_string(),
        }
    }
}
