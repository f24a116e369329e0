//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Router / error hook
//!     → ServiceRegistry::lookup(service)
//!         - consul.rs (catalog HTTP API, single-shot)
//!         - static_registry.rs (fixed table from config)
//!     → Vec<Instance> (possibly empty) or RegistryError
//! ```
//!
//! # Design Decisions
//! - The core depends only on the `ServiceRegistry` trait
//! - An empty result covers both "no instances" and "never registered"
//! - A communication failure is always an error, never an empty result
//! - No caching: every call goes to the backing store

use async_trait::async_trait;
use thiserror::Error;

pub mod consul;
pub mod instance;
pub mod static_registry;

pub use consul::ConsulRegistry;
pub use instance::{Instance, ServiceId};
pub use static_registry::StaticRegistry;

/// Errors talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configured registry endpoint cannot form a URL.
    #[error("invalid registry endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Transport, timeout or decoding failure.
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The registry answered with a non-success status.
    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Capability to resolve a service name to its current instances.
///
/// Implementations must be safe for concurrent use without external locking.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Non-blocking lookup with no tag filter.
    async fn lookup(&self, service: &ServiceId) -> Result<Vec<Instance>, RegistryError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Registry returning a fixed answer and counting calls.
    pub(crate) struct ScriptedRegistry {
        instances: Option<Vec<Instance>>,
        calls: AtomicUsize,
    }

    impl ScriptedRegistry {
        pub(crate) fn returning(instances: Vec<Instance>) -> Self {
            Self {
                instances: Some(instances),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                instances: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ServiceRegistry for ScriptedRegistry {
        async fn lookup(&self, _service: &ServiceId) -> Result<Vec<Instance>, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.instances.clone().ok_or(RegistryError::Status {
                status: 503,
                body: "No cluster leader".into(),
            })
        }
    }
}
