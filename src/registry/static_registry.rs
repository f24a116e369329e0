//! Fixed service table loaded from configuration.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::StaticServiceConfig;
use crate::registry::{Instance, RegistryError, ServiceId, ServiceRegistry};

/// In-memory registry. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    services: HashMap<String, Vec<Instance>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instances` under `name`, replacing any previous entry.
    pub fn with_service(mut self, name: impl Into<String>, instances: Vec<Instance>) -> Self {
        self.services.insert(name.into(), instances);
        self
    }

    /// Build from the `[[registry.services]]` table.
    pub fn from_config(services: &[StaticServiceConfig]) -> Self {
        let mut registry = Self::new();
        for service in services {
            let instances = service
                .instances
                .iter()
                .filter_map(|i| {
                    let instance = Instance::new(i.id.clone(), i.address.clone(), i.port);
                    if instance.is_none() {
                        tracing::warn!(service = %service.name, instance = %i.id, "Ignoring instance with port 0");
                    }
                    instance
                })
                .collect();
            registry = registry.with_service(service.name.clone(), instances);
        }
        tracing::info!(services = registry.services.len(), "Static registry loaded");
        registry
    }
}

#[async_trait]
impl ServiceRegistry for StaticRegistry {
    async fn lookup(&self, service: &ServiceId) -> Result<Vec<Instance>, RegistryError> {
        Ok(self
            .services
            .get(service.as_str())
            .cloned()
            .unwrap_or_default())
    }
}
