//! Request path decomposition.
//!
//! # Responsibilities
//! - Extract the service identifier (first path segment)
//! - Compute the backend path from the remaining segments
//!
//! # Design Decisions
//! - Split on `/` without normalisation; the second token is the service
//! - Empty paths and empty identifiers are unroutable, not errors
//! - The remainder is forwarded verbatim, still percent-encoded

use crate::registry::ServiceId;

/// A request path split into service identifier and backend remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePath {
    pub service: ServiceId,
    /// Segments after the identifier joined with `/`. May be empty.
    pub remainder: String,
}

impl ServicePath {
    /// Split `/<service>/<rest...>`. Returns `None` when there is no service.
    pub fn parse(path: &str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }

        let mut segments = path.split('/');
        segments.next();
        let service = ServiceId::new(segments.next()?)?;
        let remainder = segments.collect::<Vec<_>>().join("/");

        Some(Self { service, remainder })
    }

    /// Root-relative path sent to the backend.
    pub fn forward_path(&self) -> String {
        format!("/{}", self.remainder)
    }
}
