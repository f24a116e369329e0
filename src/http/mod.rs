//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing span)
//!     → routing (service lookup, URI rewrite, provenance header)
//!     → forwarder.rs (pooled exchange with the chosen instance)
//!     → response.rs (status-dependent rewrite)
//!     → Send to client
//!
//! Any failure along the way → error.rs (404 / 500 / 502)
//! ```

pub mod error;
pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use error::GatewayError;
pub use forwarder::{ForwardError, Forwarder};
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ResponseRewriter;
pub use server::HttpServer;
