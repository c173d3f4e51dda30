//! Skip predicates.
//!
//! A skip predicate decides, per request, whether rewriting is attempted at
//! all. It is set once when the engine is built and only read afterwards.

use axum::body::Body;
use axum::http::{HeaderName, Method, Request};

use crate::config::FilterConfig;

/// Decides whether a request bypasses the rewrite engine.
pub trait SkipPredicate: Send + Sync + std::fmt::Debug {
    /// Returns true to leave the request path untouched.
    fn should_skip(&self, req: &Request<Body>) -> bool;
}

/// Always attempt rewriting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSkip;

impl SkipPredicate for NeverSkip {
    fn should_skip(&self, _req: &Request<Body>) -> bool {
        false
    }
}

/// Adapts a closure into a [`SkipPredicate`].
pub struct SkipFn<F>(pub F);

impl<F> std::fmt::Debug for SkipFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SkipFn")
    }
}

impl<F> SkipPredicate for SkipFn<F>
where
    F: Fn(&Request<Body>) -> bool + Send + Sync,
{
    fn should_skip(&self, req: &Request<Body>) -> bool {
        (self.0)(req)
    }
}

/// Skip predicate driven by the `[filter]` configuration section.
///
/// A request is skipped if any one condition holds (OR semantics).
#[derive(Debug, Clone, Default)]
pub struct ConfigFilter {
    methods: Vec<Method>,
    headers: Vec<HeaderName>,
    path_prefixes: Vec<String>,
}

impl ConfigFilter {
    /// Build the filter, ignoring method or header names that do not parse.
    /// Validation reports those before a config is accepted.
    pub fn from_config(config: &FilterConfig) -> Self {
        let methods = config
            .skip_methods
            .iter()
            .filter_map(|m| Method::from_bytes(m.to_uppercase().as_bytes()).ok())
            .collect();
        let headers = config
            .skip_headers
            .iter()
            .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok())
            .collect();

        Self {
            methods,
            headers,
            path_prefixes: config.skip_path_prefixes.clone(),
        }
    }

    /// True if no condition is configured, i.e. nothing is ever skipped.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.headers.is_empty() && self.path_prefixes.is_empty()
    }
}

impl SkipPredicate for ConfigFilter {
    fn should_skip(&self, req: &Request<Body>) -> bool {
        if self.methods.contains(req.method()) {
            return true;
        }
        if self.headers.iter().any(|h| req.headers().contains_key(h)) {
            return true;
        }
        let path = req.uri().path();
        self.path_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_never_skip() {
        assert!(!NeverSkip.should_skip(&request(Method::GET, "/old")));
    }

    #[test]
    fn test_closure_predicate() {
        let skip = SkipFn(|req: &Request<Body>| req.method() == Method::POST);
        assert!(skip.should_skip(&request(Method::POST, "/old")));
        assert!(!skip.should_skip(&request(Method::GET, "/old")));
    }

    #[test]
    fn test_config_filter() {
        let filter = ConfigFilter::from_config(&FilterConfig {
            skip_methods: vec!["options".into()],
            skip_headers: vec!["X-Skip-Rewrite".into()],
            skip_path_prefixes: vec!["/health".into()],
        });
        assert!(!filter.is_empty());

        assert!(filter.should_skip(&request(Method::OPTIONS, "/old")));
        assert!(filter.should_skip(&request(Method::GET, "/health/live")));
        assert!(!filter.should_skip(&request(Method::GET, "/old")));

        let with_header = Request::builder()
            .uri("/old")
            .header("x-skip-rewrite", "1")
            .body(Body::default())
            .unwrap();
        assert!(filter.should_skip(&with_header));
    }

    #[test]
    fn test_empty_config_filter_never_skips() {
        let filter = ConfigFilter::from_config(&FilterConfig::default());
        assert!(filter.is_empty());
        assert!(!filter.should_skip(&request(Method::DELETE, "/anything")));
    }
}
