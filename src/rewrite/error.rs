//! Errors raised while compiling rewrite rules.
//!
//! Every variant is a configuration error: it is detected once, when the
//! engine is built, and prevents the engine from being constructed. Matching
//! a request never fails.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RewriteError {
    /// The translated pattern was rejected by the regex engine.
    #[error("invalid rewrite pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The destination references a capture the source pattern does not have.
    #[error(
        "destination `{destination}` references ${index} but `{pattern}` only captures {available}"
    )]
    CaptureOutOfRange {
        pattern: String,
        destination: String,
        index: usize,
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = RewriteError::CaptureOutOfRange {
            pattern: "/a/*".into(),
            destination: "/b/$2".into(),
            index: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "destination `/b/$2` references $2 but `/a/*` only captures 1"
        );
    }
}
