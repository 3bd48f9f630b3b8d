//! # Orchard Centralized Configuration
//!
//! This crate provides configuration loading and default values for Orchard
//! services, so the swap service, its worker and tests agree on one source of
//! truth for claim lifetimes, pool bounds and settlement retry policy.
//!
//! ## Features
//!
//! - **Layered Loading**: base TOML file, optional environment overlay, then
//!   `ORCHARD__*` environment variables
//! - **Service Defaults**: claim TTL, pool creation bounds, queue sizing
//! - **Secret Expansion**: `${VAR}` references in the claim key are expanded
//!   from the environment
//!
//! ## Usage
//!
//! ```rust,no_run
//! use config::{load_config, service};
//!
//! let settings = load_config(None, Some("dev")).unwrap();
//! assert!(settings.claims.ttl_secs <= 600);
//! let _ = service::claims::DEFAULT_TTL_SECS;
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{
    load_config, ClaimSettings, LoggingSettings, PoolSettings, ServerSettings, ServiceConfig,
    SettlementSettings,
};
