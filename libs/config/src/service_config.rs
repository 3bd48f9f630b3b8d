//! Service Configuration Module
//!
//! Provides configuration loading and management for Orchard services.
//! Supports loading from TOML files with environment-specific overrides.

use crate::service;
use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default location of the base configuration file
const DEFAULT_CONFIG_PATH: &str = "config/orchard.toml";

/// Main service configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub claims: ClaimSettings,
    pub pools: PoolSettings,
    pub settlement: SettlementSettings,
}

/// HTTP surface settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

/// Claim token settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ClaimSettings {
    pub ttl_secs: u64,
    /// Hex-encoded 256-bit key; may reference environment variables
    pub key_hex: Option<String>,
}

/// Pool creation bounds
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PoolSettings {
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_supply: Decimal,
    pub max_supply: Decimal,
    pub cap_tolerance: Decimal,
}

/// Settlement worker settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SettlementSettings {
    pub max_delivery_attempts: u32,
    pub queue_capacity: usize,
    pub redelivery_delay_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: service::server::DEFAULT_BIND_ADDRESS.to_string(),
            port: service::server::DEFAULT_PORT,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: service::logging::DEFAULT_LEVEL.to_string(),
            format: service::logging::DEFAULT_FORMAT.to_string(),
        }
    }
}

impl Default for ClaimSettings {
    fn default() -> Self {
        Self {
            ttl_secs: service::claims::DEFAULT_TTL_SECS,
            key_hex: None,
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            min_price: service::pools::MIN_PRICE,
            max_price: service::pools::MAX_PRICE,
            min_supply: service::pools::MIN_SUPPLY,
            max_supply: service::pools::MAX_SUPPLY,
            cap_tolerance: service::pools::CAP_TOLERANCE,
        }
    }
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            max_delivery_attempts: service::settlement::MAX_DELIVERY_ATTEMPTS,
            queue_capacity: service::settlement::QUEUE_CAPACITY,
            redelivery_delay_ms: service::settlement::REDELIVERY_DELAY_MS,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist; the default path is optional.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let mut builder = match base_path {
            Some(base) => Config::builder().add_source(File::from(base).required(true)),
            None => Config::builder()
                .add_source(File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false)),
        };

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (ORCHARD__SECTION__KEY)
        builder = builder.add_source(
            Environment::with_prefix("ORCHARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Expand environment variables in string values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(key) = &self.claims.key_hex {
            let expanded = shellexpand::env(key).context("Failed to expand claim key")?;
            self.claims.key_hex = Some(expanded.to_string());
        }
        Ok(())
    }

    /// Claim key from configuration, falling back to the dedicated variable
    pub fn claim_key_hex(&self) -> Option<String> {
        self.claims
            .key_hex
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var(service::claims::KEY_ENV_VAR).ok())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(base_path: Option<&Path>, environment: Option<&str>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::load(base_path, environment)?;
    config.expand_env_vars()?;
    Ok(config)
}
