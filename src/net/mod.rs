//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Routed request (absolute http:// URI)
//!     → transport.rs (pooled client: checkout idle connection or dial)
//!     → Backend instance
//! ```
//!
//! # Design Decisions
//! - One pool per process, shared by reference across request tasks
//! - The pool synchronizes checkout/return internally; callers hold no locks
//! - Idle connections are reused per host:port and expire after a timeout

pub mod transport;

pub use transport::{build_client, PooledClient};
