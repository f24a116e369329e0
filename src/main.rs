//! Service-discovery HTTP gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ routing::router ──▶ registry (Consul / static)
//!                                        │                    │
//!                                        │ ◀── instances ─────┘
//!                                        ▼
//!                                 load_balancer (random / round robin)
//!                                        │
//!                                        ▼
//!     Client ◀── http::response ◀── http::forwarder ◀── net::transport ◀──▶ Instance
//!
//!     Cross-cutting: config, observability (tracing, metrics), lifecycle
//! ```
//!
//! `GET /orders/123/items` is sent to one instance of `orders` as
//! `GET /123/items` with `X-Real-Ip` set to the caller's address.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use discovery_gateway::config::{self, GatewayConfig};
use discovery_gateway::lifecycle::{build_registry, wait_for_signal, Shutdown};
use discovery_gateway::observability::{logging, metrics};
use discovery_gateway::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "discovery-gateway", version, about = "Service-discovery HTTP gateway")]
struct Args {
    /// Path to a TOML configuration file; built-in defaults when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Consul agent host.
    #[arg(long)]
    consul_host: Option<String>,

    /// Consul agent HTTP port.
    #[arg(long)]
    consul_port: Option<u16>,

    /// Listen address, e.g. 0.0.0.0:8003.
    #[arg(long)]
    bind: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.consul_host {
            config.registry.consul.host = host.clone();
        }
        if let Some(port) = self.consul_port {
            config.registry.consul.port = port;
        }
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::read_config(path)?,
        None => GatewayConfig::default(),
    };
    args.apply(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "discovery-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        registry = ?config.registry.kind,
        policy = ?config.routing.policy,
        provenance_header = %config.routing.provenance_header,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: std::net::SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let registry = build_registry(&config.registry)?;
    let server = HttpServer::new(&config, registry)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
