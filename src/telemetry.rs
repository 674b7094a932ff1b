//! Log subscriber setup and the prometheus `/metrics` endpoint.
use hyper::{
    header::CONTENT_TYPE,
    service::{make_service_fn, service_fn},
    Body, Method, Request, Response, Server, StatusCode,
};
use serde::Deserialize;
use std::{convert::Infallible, net::SocketAddr};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::metrics::gather_metrics;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Used when RUST_LOG is not set.
    pub env_filter: String,
    pub log_json: bool,
    pub log_color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: "info".to_string(),
            log_json: false,
            log_color: true,
        }
    }
}

pub fn init_tracing(config: &LoggingConfig) -> eyre::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) => EnvFilter::try_new(env)?,
        Err(_) => EnvFilter::try_new(&config.env_filter)?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(config.log_color))
            .try_init()?;
    }
    Ok(())
}

async fn handle_metrics_request(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    if req.method() != Method::GET || req.uri().path() != "/metrics" {
        return Ok(status_response(StatusCode::NOT_FOUND));
    }
    match gather_metrics() {
        Ok(text) => Ok(Response::builder()
            .header(CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(text))
            .unwrap_or_else(|_| status_response(StatusCode::INTERNAL_SERVER_ERROR))),
        Err(err) => {
            error!(?err, "Failed to gather metrics");
            Ok(status_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn status_response(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Serves `GET /metrics` on addr until cancel fires.
/// Returns the bound address and the server task.
pub fn spawn_metrics_server(
    addr: SocketAddr,
    cancel: CancellationToken,
) -> eyre::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let make_service =
        make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle_metrics_request)) });
    let server = Server::try_bind(&addr)?.serve(make_service);
    let local_addr = server.local_addr();
    let server = server.with_graceful_shutdown(async move { cancel.cancelled().await });
    info!(%local_addr, "Metrics server started");
    let handle = tokio::spawn(async move {
        if let Err(err) = server.await {
            error!(?err, "Metrics server failed");
        }
    });
    Ok((local_addr, handle))
}
