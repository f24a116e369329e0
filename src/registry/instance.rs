//! Service identifiers and registry-reported instances.

use std::fmt;
use std::net::Ipv6Addr;

/// Logical name of a backend service, taken from the first path segment.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceId(String);

impl ServiceId {
    /// Create an identifier, rejecting the empty string.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registry-reported endpoint for a service.
///
/// Fetched fresh on every request and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Opaque instance identifier, used only for logging.
    pub id: String,
    /// Host name or IP address.
    pub address: String,
    /// TCP port, never zero.
    pub port: u16,
}

impl Instance {
    /// Create an instance. Returns `None` for port 0.
    pub fn new(id: impl Into<String>, address: impl Into<String>, port: u16) -> Option<Self> {
        if port == 0 {
            return None;
        }
        Some(Self {
            id: id.into(),
            address: address.into(),
            port,
        })
    }

    /// `address:port`, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        if self.address.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}
