//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → middleware/rewrite.rs (rewrite path, before dispatch)
//!     → server.rs proxy handler (forward to upstream)
//!     → Send upstream response to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use middleware::rewrite::{rewrite_router, RewriteHandle, RewriteLayer, RewriteService};
pub use request::X_REQUEST_ID;
pub use server::{GatewayServer, ServerError};
