//! Path rewriting gateway library.
//!
//! Rewrites inbound request paths with wildcard rules before route dispatch.
//!
//! ```
//! use path_rewrite_gateway::rewrite::RewriteEngine;
//!
//! let engine = RewriteEngine::builder()
//!     .rule("/users/*/orders/*", "/user/$1/order/$2")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(engine.apply("/users/123/orders/456").path(), "/user/123/order/456");
//! assert!(!engine.apply("/elsewhere").is_match());
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;

pub use config::schema::GatewayConfig;
pub use http::{GatewayServer, RewriteLayer};
pub use lifecycle::Shutdown;
pub use rewrite::{Rewrite, RewriteEngine, RewriteError, Rule};
