//! HTTP server setup and the gateway handler.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing)
//! - Route each request through discovery, then forward it
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::InvalidHeaderName, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::error::GatewayError;
use crate::http::forwarder::Forwarder;
use crate::http::request::{request_id_of, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics;
use crate::registry::ServiceRegistry;
use crate::routing::{Route, Router as ServiceRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ServiceRouter>,
    pub forwarder: Arc<Forwarder>,
}

/// Discovery-driven HTTP gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble routing, transport and response hook from configuration.
    ///
    /// Fails only if the configured provenance header is not a valid name.
    pub fn new(
        config: &GatewayConfig,
        registry: Arc<dyn ServiceRegistry>,
    ) -> Result<Self, InvalidHeaderName> {
        let state = AppState {
            router: Arc::new(ServiceRouter::from_config(&config.routing, registry.clone())?),
            forwarder: Arc::new(Forwarder::from_config(config, registry)),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id_of(request),
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` receives a message.
    ///
    /// In-flight exchanges are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Route by the first path segment, then forward.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id_of(&request).to_string();
    let method = request.method().to_string();
    let original_path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %original_path,
        peer = %peer,
        "Gateway request"
    );

    let (response, service) = match state.router.route(&mut request, peer).await {
        Ok(Route::Forward(target)) => {
            let response = state
                .forwarder
                .forward(request, peer, &original_path)
                .await;
            (response, target.service.to_string())
        }
        Ok(Route::Skipped) => {
            tracing::debug!(request_id = %request_id, path = %original_path, "No service in path");
            (GatewayError::NoService.into_response(), "none".to_string())
        }
        Err(err) => {
            tracing::warn!(request_id = %request_id, path = %original_path, error = %err, "Routing failed");
            let service = err.service().to_string();
            (GatewayError::from(err).into_response(), service)
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &service, start_time);
    response
}
