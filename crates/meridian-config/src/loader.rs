//! Configuration loader with layered sources.

use crate::{AppConfig, CacheBackend};
use config::{Config, ConfigError, Environment, File};
use meridian_core::MeridianError;
use std::path::Path;
use tracing::{debug, info, warn};

/// Loads and validates the layered configuration once at startup.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `MERIDIAN_` prefix
    pub fn new(config_dir: impl Into<String>) -> Result<Self, MeridianError> {
        let config = Self::load_config(&config_dir.into())?;
        Ok(Self { config })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, MeridianError> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    /// Consumes the loader, returning the configuration.
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, MeridianError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("MERIDIAN_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MERIDIAN")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error_to_meridian_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), MeridianError> {
        if config.database.url.is_empty() {
            return Err(MeridianError::Configuration("Database URL is required".to_string()));
        }

        if config.cache.backend == CacheBackend::Redis && !config.redis.enabled {
            return Err(MeridianError::Configuration(
                "cache.backend = \"redis\" requires redis.enabled = true".to_string(),
            ));
        }

        if config.cache.backend == CacheBackend::Memory && config.app.environment == "production" {
            warn!("In-memory cache backend in production; entries are per instance");
        }

        if !config.cache.fail_open {
            warn!("Cache fail-open disabled; cache outages will fail read requests");
        }

        Ok(())
    }
}

fn config_error_to_meridian_error(err: ConfigError) -> MeridianError {
    MeridianError::Configuration(err.to_string())
}
