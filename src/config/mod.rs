//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to each subsystem constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    BalancePolicy, ConsulConfig, GatewayConfig, ListenerConfig, ObservabilityConfig,
    RegistryConfig, RegistryKind, ResponseHookConfig, RewritePolicy, RoutingConfig,
    StaticInstanceConfig, StaticServiceConfig, TransportConfig,
};
pub use validation::{validate_config, ValidationError};
