//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod pubsub;
pub mod realtime;
pub mod video;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::pubsub::{PubSubBackend, PubSubConfig};
pub use self::realtime::RealtimeConfig;
pub use self::video::VideoConfig;

use crate::error::AppError;

/// Environment variable prefix for overrides (`CONSULTHUB__SERVER__PORT`).
pub const ENV_PREFIX: &str = "CONSULTHUB";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings. When absent, in-memory stores are used.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time engine settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Cross-process fan-out settings.
    #[serde(default)]
    pub pubsub: PubSubConfig,
    /// Video meeting provider settings.
    #[serde(default)]
    pub video: VideoConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `CONSULTHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let loaded: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::configuration("auth.jwt_secret must not be empty"));
        }
        if self.realtime.offline_grace_period_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.offline_grace_period_seconds must be positive",
            ));
        }
        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be positive",
            ));
        }
        if self.pubsub.backend == PubSubBackend::Redis && self.pubsub.redis_url.is_none() {
            return Err(AppError::configuration(
                "pubsub.redis_url is required for the redis backend",
            ));
        }
        if self.video.enabled
            && (self.video.account_id.is_empty()
                || self.video.client_id.is_empty()
                || self.video.client_secret.is_empty())
        {
            return Err(AppError::configuration(
                "video credentials are required when video is enabled",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.realtime.offline_grace_period_seconds, 15);
    }

    #[test]
    fn test_zero_grace_period_rejected() {
        let mut cfg = AppConfig::default();
        cfg.realtime.offline_grace_period_seconds = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut cfg = AppConfig::default();
        cfg.pubsub.backend = PubSubBackend::Redis;
        assert!(cfg.validate().is_err());
        cfg.pubsub.redis_url = Some("redis://127.0.0.1:6379".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_enabled_video_requires_credentials() {
        let mut cfg = AppConfig::default();
        cfg.video.enabled = true;
        assert!(cfg.validate().is_err());
    }
}
