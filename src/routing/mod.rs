//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, peer address)
//!     → path.rs (split into service identifier + remainder)
//!     → registry lookup (ServiceRegistry)
//!     → load_balancer (pick one instance)
//!     → router.rs (rewrite scheme/authority/path, stamp provenance header)
//!     → Return: Route::Forward(target), Route::Skipped, or RouteError
//! ```
//!
//! # Design Decisions
//! - Destinations are discovered per request, never compiled at startup
//! - Registry failure and "no instances" are distinct errors
//! - Mutation happens at most once, before any forwarding attempt

pub mod path;
pub mod router;

pub use path::ServicePath;
pub use router::{Route, RouteError, Router, Target};
