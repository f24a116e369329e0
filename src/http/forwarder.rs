//! Backend exchange over the pooled transport.
//!
//! # Responsibilities
//! - Send a routed request to its instance and stream the response back
//! - Strip hop-by-hop headers in both directions
//! - Append the caller to `X-Forwarded-For`
//! - Run the response hook before the response reaches the caller
//!
//! # Design Decisions
//! - Exactly one attempt per request, no retries
//! - Outbound requests are always HTTP/1.1
//! - Failures are classified by a second registry query (see `error.rs`)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Request, Version};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::error::{classify_failure, error_chain};
use crate::http::response::ResponseRewriter;
use crate::net::{build_client, PooledClient};
use crate::registry::ServiceRegistry;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, Error)]
pub enum ForwardError {
    /// Dial, write or read against the instance failed.
    #[error("{0}")]
    Exchange(#[source] hyper_util::client::legacy::Error),

    /// The backend body could not be read while applying the response hook.
    #[error("failed to read backend response body")]
    ResponseHook(#[source] axum::Error),
}

/// Sends routed requests and turns failures into caller responses.
pub struct Forwarder {
    client: PooledClient,
    registry: Arc<dyn ServiceRegistry>,
    rewriter: ResponseRewriter,
}

impl Forwarder {
    pub fn new(
        client: PooledClient,
        registry: Arc<dyn ServiceRegistry>,
        rewriter: ResponseRewriter,
    ) -> Self {
        Self {
            client,
            registry,
            rewriter,
        }
    }

    pub fn from_config(config: &GatewayConfig, registry: Arc<dyn ServiceRegistry>) -> Self {
        Self::new(
            build_client(&config.transport),
            registry,
            ResponseRewriter::from_config(&config.response),
        )
    }

    /// Forward an already-routed request.
    ///
    /// Never fails: exchange errors become 404/500/502 responses according
    /// to what the registry reports for `original_path`.
    pub async fn forward(
        &self,
        request: Request<Body>,
        peer: SocketAddr,
        original_path: &str,
    ) -> Response {
        match self.exchange(request, peer).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(path = %original_path, error = %error_chain(&err), "Backend exchange failed");
                classify_failure(self.registry.as_ref(), original_path, &err)
                    .await
                    .into_response()
            }
        }
    }

    /// Perform one exchange with the instance named by the request URI.
    pub async fn exchange(
        &self,
        mut request: Request<Body>,
        peer: SocketAddr,
    ) -> Result<Response, ForwardError> {
        *request.version_mut() = Version::HTTP_11;
        strip_hop_by_hop(request.headers_mut());
        append_forwarded_for(request.headers_mut(), peer);

        let method = request.method().clone();
        tracing::debug!(method = %method, uri = %request.uri(), "Sending request to instance");

        let response = self
            .client
            .request(request)
            .await
            .map_err(ForwardError::Exchange)?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        let response = Response::from_parts(parts, Body::new(body));

        self.rewriter
            .apply(&method, response)
            .await
            .map_err(ForwardError::ResponseHook)
    }
}

/// Remove the fixed hop-by-hop set plus anything listed in `Connection`.
pub(crate) fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// `X-Forwarded-For: <prior values>, <peer ip>`
pub(crate) fn append_forwarded_for(headers: &mut HeaderMap, peer: SocketAddr) {
    let ip = peer.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let combined = if prior.is_empty() {
        ip
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&combined) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ResponseHookConfig, TransportConfig};
    use crate::registry::testing::ScriptedRegistry;
    use crate::registry::Instance;
    use axum::http::StatusCode;

    fn peer() -> SocketAddr {
        "192.168.0.9:51234".parse().unwrap()
    }

    /// Backend that answers every request with its view of the request head.
    async fn spawn_echo_backend() -> SocketAddr {
        async fn echo(request: Request<Body>) -> (StatusCode, String) {
            let mut lines = vec![format!("{} {}", request.method(), request.uri())];
            for (name, value) in request.headers() {
                lines.push(format!("{}: {}", name, value.to_str().unwrap_or("")));
            }
            let status = if request.uri().path() == "/missing" {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::OK
            };
            (status, lines.join("\n"))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().fallback(echo);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn forwarder(registry: ScriptedRegistry, annotation: &str) -> Forwarder {
        Forwarder::new(
            build_client(&TransportConfig::default()),
            Arc::new(registry),
            ResponseRewriter::from_config(&ResponseHookConfig {
                annotation: annotation.into(),
                ..Default::default()
            }),
        )
    }

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session", HeaderValue::from_static("abc"));
        headers.insert(header::TE, HeaderValue::from_static("trailers"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }

    #[test]
    fn test_forwarded_for_appends() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, peer());
        assert_eq!(headers[&X_FORWARDED_FOR], "192.168.0.9");

        let mut headers = HeaderMap::new();
        headers.insert(&X_FORWARDED_FOR, HeaderValue::from_static("1.1.1.1"));
        append_forwarded_for(&mut headers, peer());
        assert_eq!(headers[&X_FORWARDED_FOR], "1.1.1.1, 192.168.0.9");
    }

    #[tokio::test]
    async fn test_exchange_reaches_backend() {
        let backend = spawn_echo_backend().await;
        let fwd = forwarder(ScriptedRegistry::returning(vec![]), "");

        let request = Request::builder()
            .uri(format!("http://{backend}/123/items?x=1"))
            .header("x-real-ip", "192.168.0.9:51234")
            .header(header::CONNECTION, "close")
            .body(Body::empty())
            .unwrap();

        let response = fwd.exchange(request, peer()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let echoed = body_of(response).await;
        assert!(echoed.starts_with("GET /123/items?x=1"));
        assert!(echoed.contains("x-real-ip: 192.168.0.9:51234"));
        assert!(echoed.contains("x-forwarded-for: 192.168.0.9"));
    }

    #[tokio::test]
    async fn test_error_response_annotated() {
        let backend = spawn_echo_backend().await;
        let fwd = forwarder(ScriptedRegistry::returning(vec![]), "[gateway] ");

        let request = Request::builder()
            .uri(format!("http://{backend}/missing"))
            .body(Body::empty())
            .unwrap();

        let response = fwd.exchange(request, peer()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let length: usize = response.headers()[header::CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        let body = body_of(response).await;
        assert!(body.starts_with("[gateway] GET /missing"));
        assert_eq!(length, body.len());
    }

    #[tokio::test]
    async fn test_dead_instance_is_internal_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let registry =
            ScriptedRegistry::returning(vec![Instance::new("i1", "127.0.0.1", port).unwrap()]);
        let fwd = forwarder(registry, "");

        let request = Request::builder()
            .uri(format!("http://127.0.0.1:{port}/123"))
            .body(Body::empty())
            .unwrap();

        let response = fwd.forward(request, peer(), "/orders/123").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_vanished_service_is_not_found() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let fwd = forwarder(ScriptedRegistry::returning(vec![]), "");

        let request = Request::builder()
            .uri(format!("http://127.0.0.1:{port}/123"))
            .body(Body::empty())
            .unwrap();

        let response = fwd.forward(request, peer(), "/orders/123").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, "orders Not Found");
    }
}
