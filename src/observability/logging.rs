//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the log level from `RUST_LOG`, falling back to config

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for a given base level.
pub fn default_directives(level: &str) -> String {
    format!("path_rewrite_gateway={level},tower_http={level}")
}

/// Install the global subscriber. `RUST_LOG` overrides `level`.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives("debug"),
            "path_rewrite_gateway=debug,tower_http=debug"
        );
    }
}
