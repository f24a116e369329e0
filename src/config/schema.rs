//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service registry the router resolves instances from.
    pub registry: RegistryConfig,

    /// Routing behaviour (selection policy, provenance header).
    pub routing: RoutingConfig,

    /// Outbound connection pool settings.
    pub transport: TransportConfig,

    /// Response post-processing.
    pub response: ResponseHookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8003").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8003".to_string(),
        }
    }
}

/// Which registry backend to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    /// Consul catalog over HTTP.
    #[default]
    Consul,
    /// Fixed instance list from this file.
    Static,
}

/// Service registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry backend.
    pub kind: RegistryKind,

    /// Consul agent settings (used when `kind = "consul"`).
    pub consul: ConsulConfig,

    /// Static service table (used when `kind = "static"`).
    pub services: Vec<StaticServiceConfig>,
}

/// Consul catalog client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Consul agent host.
    pub host: String,

    /// Consul HTTP API port.
    pub port: u16,

    /// Optional datacenter passed as `dc`.
    pub datacenter: Option<String>,

    /// Optional ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,

    /// Per-lookup timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8500,
            datacenter: None,
            token: None,
            timeout_ms: 5_000,
        }
    }
}

/// A statically registered service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticServiceConfig {
    /// Logical service name (first path segment).
    pub name: String,

    /// Instances serving this name. May be empty.
    #[serde(default)]
    pub instances: Vec<StaticInstanceConfig>,
}

/// A statically registered instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticInstanceConfig {
    /// Instance identifier, used for logging only.
    pub id: String,

    /// Host name or IP address.
    pub address: String,

    /// TCP port (1-65535).
    pub port: u16,
}

/// Instance selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Uniform random choice.
    #[default]
    Random,
    /// Rotate through instances in registry order.
    RoundRobin,
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Instance selection policy.
    pub policy: BalancePolicy,

    /// Header carrying the caller's network address to the backend.
    pub provenance_header: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            policy: BalancePolicy::Random,
            provenance_header: "X-Real-Ip".to_string(),
        }
    }
}

/// Outbound transport (connection pool) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// TCP keepalive interval in seconds.
    pub keepalive_secs: u64,

    /// Maximum idle pooled connections kept per backend host.
    pub max_idle_connections: usize,

    /// Idle pooled connections are closed after this many seconds.
    pub idle_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            keepalive_secs: 30,
            max_idle_connections: 100,
            idle_timeout_secs: 90,
        }
    }
}

/// Which backend responses the response hook rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RewritePolicy {
    /// Status outside {200, 201, 203, 204}.
    #[default]
    NonSuccess,
    /// Every response.
    Always,
}

/// Response hook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseHookConfig {
    /// Enable the response hook.
    pub enabled: bool,

    /// Which responses are rewritten.
    pub policy: RewritePolicy,

    /// Text prepended to rewritten bodies.
    pub annotation: String,

    /// Maximum backend body size buffered for a rewrite, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ResponseHookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: RewritePolicy::NonSuccess,
            annotation: String::new(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
