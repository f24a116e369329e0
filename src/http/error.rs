//! Caller-visible failures and the exchange error hook.
//!
//! # Status Mapping
//! - no service in path → 404
//! - service has zero instances → 404 `"<service> Not Found"`
//! - registry unreachable → 502
//! - instance not addressable → 502
//! - exchange with a chosen instance failed → 500 with the error text
//!
//! The same mapping applies whether the failure is detected while routing
//! or while classifying a failed exchange.

use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::forwarder::ForwardError;
use crate::observability::metrics;
use crate::registry::{ServiceId, ServiceRegistry};
use crate::routing::{RouteError, ServicePath};

/// Failure reported to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no service identifier in request path")]
    NoService,

    #[error("{0} Not Found")]
    ServiceNotFound(ServiceId),

    #[error("service registry unavailable")]
    RegistryUnavailable,

    #[error("backend instance for {0} is not addressable")]
    InvalidTarget(ServiceId),

    #[error("{0}")]
    Transport(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoService | GatewayError::ServiceNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::RegistryUnavailable | GatewayError::InvalidTarget(_) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

impl From<RouteError> for GatewayError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::RegistryUnavailable { .. } => GatewayError::RegistryUnavailable,
            RouteError::NoHealthyInstance { service } => GatewayError::ServiceNotFound(service),
            RouteError::InvalidTarget { service, .. } => GatewayError::InvalidTarget(service),
        }
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
///
/// A cause whose text repeats the previous link (wrappers that display their
/// inner error and also report it as the source) is printed once.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut previous = message.clone();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text != previous {
            message.push_str(": ");
            message.push_str(&text);
        }
        previous = text;
        source = cause.source();
    }
    message
}

/// Classify a failed exchange by asking the registry about the service again.
///
/// Distinguishes "the service has no backend" from "a backend vanished
/// between lookup and dial".
pub async fn classify_failure(
    registry: &dyn ServiceRegistry,
    original_path: &str,
    error: &ForwardError,
) -> GatewayError {
    let Some(parsed) = ServicePath::parse(original_path) else {
        metrics::record_forward_error("transport");
        return GatewayError::Transport(error_chain(error));
    };

    match registry.lookup(&parsed.service).await {
        Err(lookup_error) => {
            tracing::warn!(
                service = %parsed.service,
                error = %lookup_error,
                "Registry lookup failed while classifying exchange error"
            );
            metrics::record_forward_error("registry_unavailable");
            GatewayError::RegistryUnavailable
        }
        Ok(instances) if instances.is_empty() => {
            metrics::record_forward_error("service_not_found");
            GatewayError::ServiceNotFound(parsed.service)
        }
        Ok(_) => {
            metrics::record_forward_error("transport");
            GatewayError::Transport(error_chain(error))
        }
    }
}
