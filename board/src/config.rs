//! Environment-driven configuration.
//!
//! DESIGN
//! ======
//! Settings come from environment variables, optionally seeded from a `.env`
//! file. Tuning knobs fall back to defaults when unset or unparseable;
//! backend coordinates (URL, key) are required and reported when missing.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use canvas::geometry::Size;
use canvas::input::BoundaryPolicy;
use tracing::debug;

use crate::error::ErrorCode;

pub const API_URL_VAR: &str = "NOTEBOARD_API_URL";
pub const API_KEY_VAR: &str = "NOTEBOARD_API_KEY";
pub const ACCESS_TOKEN_VAR: &str = "NOTEBOARD_ACCESS_TOKEN";
pub const IMAGE_BUCKET_VAR: &str = "NOTEBOARD_IMAGE_BUCKET";
pub const QUEUE_CAPACITY_VAR: &str = "NOTEBOARD_PERSIST_QUEUE_CAPACITY";
pub const DRAG_POLICY_VAR: &str = "NOTEBOARD_DRAG_POLICY";
pub const SURFACE_WIDTH_VAR: &str = "NOTEBOARD_SURFACE_WIDTH";
pub const SURFACE_HEIGHT_VAR: &str = "NOTEBOARD_SURFACE_HEIGHT";

pub const DEFAULT_IMAGE_BUCKET: &str = "dashboard-images";
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }
}

/// Load `.env` from the working directory if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env loaded"),
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(ConfigError::Missing { var }),
    }
}

fn env_optional(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_owned()),
        _ => None,
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Coordinates of the hosted backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Project base URL, without a trailing slash.
    pub base_url: String,
    /// Public API key sent as the `apikey` header.
    pub api_key: String,
    /// Signed-in user's access token. Without it there is no user identity.
    pub access_token: Option<String>,
    /// Storage bucket for uploaded images.
    pub image_bucket: String,
}

impl ApiConfig {
    /// Read backend settings from the environment.
    ///
    /// - `NOTEBOARD_API_URL`: required
    /// - `NOTEBOARD_API_KEY`: required
    /// - `NOTEBOARD_ACCESS_TOKEN`: optional user token
    /// - `NOTEBOARD_IMAGE_BUCKET`: defaults to `dashboard-images`
    ///
    /// # Errors
    ///
    /// Returns `Missing` when the URL or key is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_required(API_URL_VAR)?;
        let api_key = env_required(API_KEY_VAR)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            access_token: env_optional(ACCESS_TOKEN_VAR),
            image_bucket: env_optional(IMAGE_BUCKET_VAR).unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.to_owned()),
        })
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Tuning for the board controller and its interaction engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Capacity of the bounded persistence queue.
    pub queue_capacity: usize,
    /// How drags are kept on the board surface.
    pub policy: BoundaryPolicy,
    /// Initial board surface size; zero means unknown until the host reports it.
    pub surface: Size,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY, policy: BoundaryPolicy::Clamp, surface: Size::default() }
    }
}

impl ControllerConfig {
    /// Read controller tuning from the environment.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` when `NOTEBOARD_DRAG_POLICY` names an unknown policy
    /// or the queue capacity is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let policy = match env_optional(DRAG_POLICY_VAR) {
            Some(raw) => raw
                .parse::<BoundaryPolicy>()
                .map_err(|e| ConfigError::Invalid { var: DRAG_POLICY_VAR, message: e.to_string() })?,
            None => BoundaryPolicy::default(),
        };
        let queue_capacity = env_parse(QUEUE_CAPACITY_VAR, DEFAULT_QUEUE_CAPACITY);
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid { var: QUEUE_CAPACITY_VAR, message: "must be at least 1".into() });
        }
        let surface = Size::new(env_parse(SURFACE_WIDTH_VAR, 0.0), env_parse(SURFACE_HEIGHT_VAR, 0.0)).sanitized();
        Ok(Self { queue_capacity, policy, surface })
    }
}
