//! Route lookup and request rewriting.
//!
//! # Responsibilities
//! - Derive the service identifier from the request path
//! - Resolve it to one instance via the registry and selection policy
//! - Rewrite scheme, authority and path of the request in place
//! - Stamp the provenance header with the caller's address
//!
//! # Design Decisions
//! - No caching: one registry lookup per request
//! - The request is only mutated after a successful resolution
//! - Provenance header is overwritten unconditionally (single-hop trust)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::InvalidHeaderName;
use axum::http::uri::Scheme;
use axum::http::{HeaderName, HeaderValue, Request, Uri};
use thiserror::Error;

use crate::config::RoutingConfig;
use crate::load_balancer::{self, LoadBalancer};
use crate::observability::metrics;
use crate::registry::{Instance, RegistryError, ServiceId, ServiceRegistry};
use crate::routing::path::ServicePath;

/// Reasons a request cannot be routed.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The registry could not be queried.
    #[error("registry lookup for '{service}' failed: {source}")]
    RegistryUnavailable {
        service: ServiceId,
        #[source]
        source: RegistryError,
    },

    /// The registry answered with zero instances.
    #[error("no healthy instance for service '{service}'")]
    NoHealthyInstance { service: ServiceId },

    /// The chosen instance cannot be turned into a request URI.
    #[error("instance '{instance}' of service '{service}' is not addressable: {reason}")]
    InvalidTarget {
        service: ServiceId,
        instance: String,
        reason: String,
    },
}

impl RouteError {
    pub fn service(&self) -> &ServiceId {
        match self {
            RouteError::RegistryUnavailable { service, .. }
            | RouteError::NoHealthyInstance { service }
            | RouteError::InvalidTarget { service, .. } => service,
        }
    }
}

/// Destination chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub service: ServiceId,
    pub instance: Instance,
    /// Root-relative backend path (without query).
    pub path: String,
}

/// Outcome of routing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// No service identifier in the path; the request must not be forwarded.
    Skipped,
    /// The request now points at `Target`.
    Forward(Target),
}

/// Resolves requests to registry-discovered instances.
pub struct Router {
    registry: Arc<dyn ServiceRegistry>,
    balancer: Box<dyn LoadBalancer>,
    provenance_header: HeaderName,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("balancer", &self.balancer)
            .field("provenance_header", &self.provenance_header)
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        balancer: Box<dyn LoadBalancer>,
        provenance_header: HeaderName,
    ) -> Self {
        Self {
            registry,
            balancer,
            provenance_header,
        }
    }

    /// Build a router from the `[routing]` section.
    pub fn from_config(
        config: &RoutingConfig,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Result<Self, InvalidHeaderName> {
        let header = HeaderName::try_from(config.provenance_header.as_str())?;
        Ok(Self::new(
            registry,
            load_balancer::from_policy(config.policy),
            header,
        ))
    }

    /// Resolve a path to a target without touching any request.
    ///
    /// `Ok(None)` means the path names no service.
    pub async fn resolve(&self, path: &str) -> Result<Option<Target>, RouteError> {
        tracing::debug!(path = %path, "Resolving request path");

        let Some(parsed) = ServicePath::parse(path) else {
            tracing::debug!(path = %path, "No service identifier in path, not routing");
            return Ok(None);
        };
        let backend_path = parsed.forward_path();
        let service = parsed.service;

        let instances = match self.registry.lookup(&service).await {
            Ok(instances) => instances,
            Err(source) => {
                tracing::warn!(path = %path, service = %service, error = %source, "Registry lookup failed");
                metrics::record_registry_lookup("error");
                return Err(RouteError::RegistryUnavailable { service, source });
            }
        };

        let Some(instance) = self.balancer.select(&instances).cloned() else {
            tracing::warn!(path = %path, service = %service, "No instances registered for service");
            metrics::record_registry_lookup("empty");
            return Err(RouteError::NoHealthyInstance { service });
        };

        metrics::record_registry_lookup("found");
        tracing::info!(
            path = %path,
            service = %service,
            instance_id = %instance.id,
            authority = %instance.authority(),
            candidates = instances.len(),
            "Resolved service instance"
        );

        Ok(Some(Target {
            service,
            instance,
            path: backend_path,
        }))
    }

    /// Resolve and apply a destination to `request`.
    ///
    /// On `Route::Skipped` or any error the request is left untouched.
    pub async fn route<B: Send>(
        &self,
        request: &mut Request<B>,
        peer: SocketAddr,
    ) -> Result<Route, RouteError> {
        let path = request.uri().path().to_string();
        let Some(target) = self.resolve(&path).await? else {
            return Ok(Route::Skipped);
        };

        let uri = rewrite_uri(request.uri(), &target).map_err(|reason| {
            tracing::warn!(service = %target.service, instance_id = %target.instance.id, reason = %reason, "Instance address rejected");
            RouteError::InvalidTarget {
                service: target.service.clone(),
                instance: target.instance.id.clone(),
                reason,
            }
        })?;
        *request.uri_mut() = uri;

        // TODO: inject the authenticated principal here once token validation lands.
        if let Ok(value) = HeaderValue::from_str(&peer.to_string()) {
            request
                .headers_mut()
                .insert(self.provenance_header.clone(), value);
        }

        Ok(Route::Forward(target))
    }
}

/// `http://<instance>/<remainder>?<original query>`
fn rewrite_uri(original: &Uri, target: &Target) -> Result<Uri, String> {
    let authority = target.instance.authority();
    let path_and_query = match original.query() {
        Some(query) => format!("{}?{}", target.path, query),
        None => target.path.clone(),
    };

    Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .map_err(|e| e.to_string())
}
