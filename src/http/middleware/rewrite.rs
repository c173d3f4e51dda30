//! Rewrite middleware.
//!
//! Applies the [`RewriteEngine`] to the request path before the wrapped
//! service sees it. Layers added with `Router::layer` run after routing, so
//! this layer has to wrap the router from the outside for the rewritten path
//! to be the one that is dispatched.
//!
//! Query strings: rules see only the path. If the expanded destination
//! carries its own query (`/search?q=$1`), the request's original query is
//! appended to it with `&`; otherwise the original query is kept as-is.

use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::OriginalUri;
use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};
use axum::Router;
use tower::{Layer, Service};

use crate::observability::metrics::{self, RewriteOutcome};
use crate::rewrite::{Rewrite, RewriteEngine};

/// Shared, swappable reference to the active engine.
///
/// Requests load the current engine without locking; a reload builds a new
/// engine and swaps it in atomically.
#[derive(Debug, Clone)]
pub struct RewriteHandle {
    engine: Arc<ArcSwap<RewriteEngine>>,
}

impl RewriteHandle {
    pub fn new(engine: RewriteEngine) -> Self {
        Self {
            engine: Arc::new(ArcSwap::from_pointee(engine)),
        }
    }

    /// The engine currently in effect.
    pub fn load(&self) -> Arc<RewriteEngine> {
        self.engine.load_full()
    }

    /// Replace the active engine. Requests already in flight keep the old one.
    pub fn swap(&self, engine: RewriteEngine) {
        self.engine.store(Arc::new(engine));
    }
}

/// Tower layer that rewrites request paths.
#[derive(Debug, Clone)]
pub struct RewriteLayer {
    handle: RewriteHandle,
}

impl RewriteLayer {
    pub fn new(engine: RewriteEngine) -> Self {
        Self::from_handle(RewriteHandle::new(engine))
    }

    pub fn from_handle(handle: RewriteHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &RewriteHandle {
        &self.handle
    }
}

impl<S> Layer<S> for RewriteLayer {
    type Service = RewriteService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RewriteService {
            inner,
            handle: self.handle.clone(),
        }
    }
}

/// Tower service that rewrites the request path, then calls `inner`.
#[derive(Debug, Clone)]
pub struct RewriteService<S> {
    inner: S,
    handle: RewriteHandle,
}

impl<S> Service<Request<Body>> for RewriteService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let engine = self.handle.load();
        let outcome = rewrite_request(&engine, &mut req);
        metrics::record_rewrite(outcome);
        self.inner.call(req)
    }
}

/// Apply `engine` to `req` in place.
///
/// On a match the path is replaced, the query string is kept, and the
/// original URI is stored as [`OriginalUri`] for handlers that need it.
pub fn rewrite_request(engine: &RewriteEngine, req: &mut Request<Body>) -> RewriteOutcome {
    if engine.should_skip(req) {
        tracing::trace!(path = %req.uri().path(), "Rewrite skipped by filter");
        return RewriteOutcome::Skipped;
    }

    let (new_path, rule) = match engine.apply(req.uri().path()) {
        Rewrite::Matched { path, rule } => (path, rule),
        Rewrite::Unmatched(_) => return RewriteOutcome::Unmatched,
    };

    let original = req.uri().clone();
    match replace_path(&original, &new_path) {
        Ok(uri) => {
            tracing::debug!(from = %original.path(), to = %uri.path(), rule, "Rewrote request path");
            req.extensions_mut().insert(OriginalUri(original));
            *req.uri_mut() = uri;
            RewriteOutcome::Rewritten
        }
        Err(e) => {
            tracing::warn!(
                from = %original.path(),
                to = %new_path,
                rule,
                error = %e,
                "Rewritten path is not a valid URI, passing request through"
            );
            RewriteOutcome::Invalid
        }
    }
}

/// Build a URI like `uri` but with `destination`, merging the original query
/// string after any query the destination already has.
fn replace_path(uri: &Uri, destination: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = match (destination.contains('?'), uri.query()) {
        (_, None) | (_, Some("")) => destination.to_string(),
        (true, Some(query)) => format!("{destination}&{query}"),
        (false, Some(query)) => format!("{destination}?{query}"),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}

/// Wrap `router` so every request is rewritten before it is dispatched.
///
/// The result is itself a `Router`, so further layers (tracing, timeouts)
/// can be added and it can be served directly.
pub fn rewrite_router(router: Router, handle: RewriteHandle) -> Router {
    Router::new().fallback_service(RewriteLayer::from_handle(handle).layer(router))
}
