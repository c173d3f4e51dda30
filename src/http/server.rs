//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum application with the rewrite layer in front of routing
//! - Wire up middleware (tracing, timeout, request ID)
//! - Forward (possibly rewritten) requests to the upstream
//! - Swap in a new rewrite engine when the config changes

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::middleware::rewrite::{rewrite_router, RewriteHandle};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::rewrite::{RewriteEngine, RewriteError};

/// Errors building the gateway from a configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("rewrite rules: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("invalid upstream address `{address}`: {source}")]
    Upstream {
        address: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },
}

/// State injected into the forwarding handler.
#[derive(Clone)]
pub struct GatewayState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// HTTP server that rewrites request paths and forwards them upstream.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    handle: RewriteHandle,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    ///
    /// Fails if any rewrite rule does not compile.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let engine = RewriteEngine::from_config(&config)?;
        let upstream = Authority::from_str(&config.upstream.address).map_err(|source| {
            ServerError::Upstream {
                address: config.upstream.address.clone(),
                source,
            }
        })?;

        tracing::info!(
            rules = engine.rules().len(),
            upstream = %upstream,
            "Rewrite engine compiled"
        );

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = GatewayState { client, upstream };
        let handle = RewriteHandle::new(engine);

        let router = Self::build_router(&config, state, handle.clone());
        Ok(Self {
            router,
            config,
            handle,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: GatewayState, handle: RewriteHandle) -> Router {
        let proxy = Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state);

        rewrite_router(proxy, handle)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let handle = self.handle.clone();
        let mut current = self.config.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_config_update(&handle, &mut current, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Handle to the active rewrite engine.
    pub fn rewrite_handle(&self) -> &RewriteHandle {
        &self.handle
    }
}

/// Rebuild the rewrite engine from `new` and swap it in. On success `new`
/// becomes `current`; a rejected config leaves both untouched.
///
/// Only rules and filter are reloadable; listener, upstream and timeout
/// changes need a restart.
fn apply_config_update(
    handle: &RewriteHandle,
    current: &mut GatewayConfig,
    new: GatewayConfig,
) -> bool {
    let engine = match RewriteEngine::from_config(&new) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Rejected rewrite rules, keeping current engine");
            return false;
        }
    };

    let rules = engine.rules().len();
    handle.swap(engine);
    tracing::info!(rules, "Rewrite rules reloaded");

    if new.listener.bind_address != current.listener.bind_address
        || new.upstream.address != current.upstream.address
        || new.timeouts.request_secs != current.timeouts.request_secs
    {
        tracing::warn!("Listener, upstream and timeout changes take effect after restart");
    }
    *current = new;
    true
}

/// Forward the request to the upstream, keeping its (rewritten) path.
async fn proxy_handler(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method, 500, start_time);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid upstream URI").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %parts.uri,
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
