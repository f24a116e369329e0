//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Registry lookup → Vec<Instance> for the service
//!     → Apply selection policy:
//!         - random.rs (uniform random choice, default)
//!         - round_robin.rs (rotate through instances)
//!     → Return chosen instance or None when the list is empty
//! ```
//!
//! # Design Decisions
//! - Policies see only registry-reported membership (no health, latency
//!   or connection counts)
//! - No session affinity
//! - No retry across instances; one pick per request

use crate::config::BalancePolicy;
use crate::registry::Instance;

pub mod random;
pub mod round_robin;

pub use random::RandomChoice;
pub use round_robin::RoundRobin;

/// Instance selection policy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick one instance. Returns `None` only for an empty slice.
    fn select<'a>(&self, instances: &'a [Instance]) -> Option<&'a Instance>;
}

/// Build the balancer named by configuration.
pub fn from_policy(policy: BalancePolicy) -> Box<dyn LoadBalancer> {
    match policy {
        BalancePolicy::Random => Box::new(RandomChoice::new()),
        BalancePolicy::RoundRobin => Box::new(RoundRobin::new()),
    }
}
