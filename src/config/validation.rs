//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check the static service table for duplicates and bad instances
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, RegistryKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("registry.consul.host must not be empty")]
    EmptyConsulHost,

    #[error("invalid provenance header name '{0}'")]
    InvalidHeader(String),

    #[error("static service name must be a non-empty path segment, got '{0}'")]
    InvalidServiceName(String),

    #[error("static service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("instance '{instance}' of service '{service}' has port 0")]
    InstancePortZero { service: String, instance: String },

    #[error("instance '{instance}' of service '{service}' has an empty address")]
    InstanceAddressEmpty { service: String, instance: String },
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if HeaderName::try_from(config.routing.provenance_header.as_str()).is_err() {
        errors.push(ValidationError::InvalidHeader(
            config.routing.provenance_header.clone(),
        ));
    }

    let transport = &config.transport;
    for (field, value) in [
        ("transport.connect_timeout_secs", transport.connect_timeout_secs),
        ("transport.idle_timeout_secs", transport.idle_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.response.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "response.max_body_bytes",
        });
    }

    match config.registry.kind {
        RegistryKind::Consul => {
            let consul = &config.registry.consul;
            if consul.host.trim().is_empty() {
                errors.push(ValidationError::EmptyConsulHost);
            }
            if consul.port == 0 {
                errors.push(ValidationError::Zero {
                    field: "registry.consul.port",
                });
            }
            if consul.timeout_ms == 0 {
                errors.push(ValidationError::Zero {
                    field: "registry.consul.timeout_ms",
                });
            }
        }
        RegistryKind::Static => {
            let mut seen = HashSet::new();
            for service in &config.registry.services {
                if service.name.is_empty() || service.name.contains('/') {
                    errors.push(ValidationError::InvalidServiceName(service.name.clone()));
                }
                if !seen.insert(service.name.as_str()) {
                    errors.push(ValidationError::DuplicateService(service.name.clone()));
                }
                for instance in &service.instances {
                    if instance.port == 0 {
                        errors.push(ValidationError::InstancePortZero {
                            service: service.name.clone(),
                            instance: instance.id.clone(),
                        });
                    }
                    if instance.address.trim().is_empty() {
                        errors.push(ValidationError::InstanceAddressEmpty {
                            service: service.name.clone(),
                            instance: instance.id.clone(),
                        });
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{StaticInstanceConfig, StaticServiceConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.transport.connect_timeout_secs = 0;
        config.registry.consul.host = "".into();
        config.routing.provenance_header = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyConsulHost));
        assert!(errors.contains(&ValidationError::Zero {
            field: "transport.connect_timeout_secs"
        }));
    }

    #[test]
    fn test_static_services_checked() {
        let mut config = GatewayConfig::default();
        config.registry.kind = RegistryKind::Static;
        let instance = StaticInstanceConfig {
            id: "i1".into(),
            address: "10.0.0.5".into(),
            port: 0,
        };
        config.registry.services = vec![
            StaticServiceConfig {
                name: "orders".into(),
                instances: vec![instance],
            },
            StaticServiceConfig {
                name: "orders".into(),
                instances: vec![],
            },
        ];
        // Consul settings are ignored for the static registry
        config.registry.consul.host = "".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InstancePortZero {
                    service: "orders".into(),
                    instance: "i1".into(),
                },
                ValidationError::DuplicateService("orders".into()),
            ]
        );
    }
}
