//! Consul catalog client.
//!
//! # Responsibilities
//! - Query `/v1/catalog/service/{name}` for the instances of a service
//! - Map catalog entries to `Instance` values
//! - Surface transport, status and decoding failures as `RegistryError`
//!
//! # Design Decisions
//! - Single-shot lookups: no `index`/`wait` blocking-query parameters
//! - No tag filter
//! - `ServiceAddress` falls back to the node `Address` when empty, as the
//!   catalog API documents
//! - The underlying `reqwest::Client` is pooled and cheap to share

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::ConsulConfig;
use crate::registry::{Instance, RegistryError, ServiceId, ServiceRegistry};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// One row of the catalog service listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogEntry {
    #[serde(default)]
    address: String,
    #[serde(rename = "ServiceID", default)]
    service_id: String,
    #[serde(default)]
    service_address: String,
    #[serde(default)]
    service_port: u16,
}

impl CatalogEntry {
    fn into_instance(self, service: &ServiceId) -> Option<Instance> {
        let address = if self.service_address.is_empty() {
            self.address
        } else {
            self.service_address
        };
        let instance = Instance::new(self.service_id, address, self.service_port);
        if instance.is_none() {
            tracing::warn!(service = %service, "Ignoring catalog entry with port 0");
        }
        instance
    }
}

/// Registry backed by the Consul catalog HTTP API.
#[derive(Debug, Clone)]
pub struct ConsulRegistry {
    client: reqwest::Client,
    base_url: Url,
    datacenter: Option<String>,
    token: Option<String>,
}

impl ConsulRegistry {
    /// Create a client for the agent at `config.host:config.port`.
    pub fn new(config: &ConsulConfig) -> Result<Self, RegistryError> {
        let endpoint = format!("http://{}:{}", config.host, config.port);
        let base_url =
            Url::parse(&endpoint).map_err(|_| RegistryError::InvalidEndpoint(endpoint.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        tracing::info!(endpoint = %base_url, datacenter = ?config.datacenter, "Consul registry configured");

        Ok(Self {
            client,
            base_url,
            datacenter: config.datacenter.clone(),
            token: config.token.clone(),
        })
    }

    fn catalog_url(&self, service: &ServiceId) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RegistryError::InvalidEndpoint(self.base_url.to_string()))?;
            segments
                .clear()
                .extend(["v1", "catalog", "service", service.as_str()]);
        }
        if let Some(dc) = &self.datacenter {
            url.query_pairs_mut().append_pair("dc", dc);
        }
        Ok(url)
    }
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn lookup(&self, service: &ServiceId) -> Result<Vec<Instance>, RegistryError> {
        let url = self.catalog_url(service)?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let entries: Option<Vec<CatalogEntry>> = response.json().await?;
        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.into_instance(service))
            .collect())
    }
}
