//! Startup wiring.
//!
//! # Design Decisions
//! - Fail fast: a registry that cannot be constructed aborts startup
//! - The registry is never contacted at startup; an unreachable agent only
//!   affects the requests that need it

use std::sync::Arc;

use crate::config::{RegistryConfig, RegistryKind};
use crate::registry::{ConsulRegistry, RegistryError, ServiceRegistry, StaticRegistry};

/// Build the registry backend selected by `[registry] kind`.
pub fn build_registry(config: &RegistryConfig) -> Result<Arc<dyn ServiceRegistry>, RegistryError> {
    match config.kind {
        RegistryKind::Consul => {
            tracing::info!(
                host = %config.consul.host,
                port = config.consul.port,
                datacenter = ?config.consul.datacenter,
                "Using Consul catalog"
            );
            Ok(Arc::new(ConsulRegistry::new(&config.consul)?))
        }
        RegistryKind::Static => {
            tracing::info!(services = config.services.len(), "Using static service table");
            Ok(Arc::new(StaticRegistry::from_config(&config.services)))
        }
    }
}
