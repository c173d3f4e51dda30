//! Source pattern compilation.
//!
//! # Responsibilities
//! - Translate a wildcard path pattern into an anchored regex
//! - Record how many capture slots the pattern provides
//! - Extract captures from a matching path
//!
//! # Design Decisions
//! - `*` is the only special character; everything else matches literally
//! - Each `*` becomes `(.*)`: zero or more characters, greedy
//! - Anchored at both ends so a pattern never matches part of a path
//! - Compiled once at startup, never re-parsed per request

use regex::Regex;

use crate::rewrite::error::RewriteError;

/// The wildcard token in source patterns.
pub const WILDCARD: char = '*';

const WILDCARD_CAPTURE: &str = "(.*)";

/// Captured wildcard values, in left-to-right order of the pattern.
///
/// Index 1 is the first wildcard, matching the `$1` reference in templates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSet {
    values: Vec<String>,
}

impl CaptureSet {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Capture at the 1-based `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A source pattern compiled into a matcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    capture_count: usize,
}

impl CompiledPattern {
    /// The pattern as written in configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of wildcard slots in the pattern.
    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Returns true if `path` matches the whole pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` against the pattern, returning the captured wildcards.
    pub fn captures(&self, path: &str) -> Option<CaptureSet> {
        let caps = self.regex.captures(path)?;
        let values = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        Some(CaptureSet::new(values))
    }
}

/// Compile a source pattern such as `/users/*/orders/*`.
pub fn compile(source: &str) -> Result<CompiledPattern, RewriteError> {
    let mut translated = String::with_capacity(source.len() + 8);
    translated.push('^');

    let mut capture_count = 0;
    for (i, literal) in source.split(WILDCARD).enumerate() {
        if i > 0 {
            translated.push_str(WILDCARD_CAPTURE);
            capture_count += 1;
        }
        translated.push_str(&regex::escape(literal));
    }
    translated.push('$');

    let regex = Regex::new(&translated).map_err(|e| RewriteError::InvalidPattern {
        pattern: source.to_string(),
        source: e,
    })?;

    Ok(CompiledPattern {
        source: source.to_string(),
        regex,
        capture_count,
    })
}
