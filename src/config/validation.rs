//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses (listener, upstream, metrics) and value ranges (timeouts > 0)
//! - Compile every rewrite rule and report the ones that fail
//! - Check filter method and header names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use axum::http::{HeaderName, Method};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::rewrite::{CompiledRule, RewriteError, Rule};

/// A single failed semantic check.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid {field} `{value}`: expected host:port")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("rule #{index}: {source}")]
    Rule {
        index: usize,
        #[source]
        source: RewriteError,
    },

    #[error("filter.skip_methods: invalid method `{0}`")]
    InvalidMethod(String),

    #[error("filter.skip_headers: invalid header name `{0}`")]
    InvalidHeader(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.upstream.address.parse::<Authority>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "upstream.address",
            value: config.upstream.address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    for (index, rule) in config.rules.iter().enumerate() {
        if let Err(source) = CompiledRule::compile(Rule::from(rule)) {
            errors.push(ValidationError::Rule { index, source });
        }
    }

    for method in &config.filter.skip_methods {
        if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for header in &config.filter.skip_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeader(header.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
