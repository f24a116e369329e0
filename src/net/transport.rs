//! Pooled outbound HTTP transport.
//!
//! # Responsibilities
//! - Build the single connection pool shared by all forwarded requests
//! - Apply connect timeout, TCP keepalive and idle-pool limits
//!
//! # Design Decisions
//! - Constructed once and injected, never a global
//! - Plain HTTP only; the gateway never dials backends over TLS
//! - Limits are fixed at construction, no per-request override

use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::TransportConfig;

/// Connection-pooling client used for every backend exchange.
pub type PooledClient = Client<HttpConnector, Body>;

/// Build the pooled client from configuration.
pub fn build_client(config: &TransportConfig) -> PooledClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
    connector.set_keepalive(Some(Duration::from_secs(config.keepalive_secs)));
    connector.set_nodelay(true);

    tracing::debug!(
        connect_timeout_secs = config.connect_timeout_secs,
        keepalive_secs = config.keepalive_secs,
        max_idle_connections = config.max_idle_connections,
        idle_timeout_secs = config.idle_timeout_secs,
        "Building outbound connection pool"
    );

    Client::builder(TokioExecutor::new())
        .pool_timer(TokioTimer::new())
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .pool_max_idle_per_host(config.max_idle_connections)
        .build(connector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_connect_refused_is_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let client = build_client(&TransportConfig {
            connect_timeout_secs: 1,
            ..Default::default()
        });
        let req = Request::builder()
            .uri(format!("http://127.0.0.1:{port}/"))
            .body(Body::empty())
            .unwrap();

        let err = client.request(req).await.unwrap_err();
        assert!(err.is_connect());
    }
}
