//! Rule evaluation and path rewriting.
//!
//! # Responsibilities
//! - Compile every configured rule up front
//! - Evaluate an incoming path against rules in a fixed order
//! - Expand the first matching rule's destination with its captures
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - First match wins, in declaration order
//! - Construction is all-or-nothing: one bad rule fails the whole engine
//! - No match is not an error; the path passes through unchanged

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;

use crate::config::{GatewayConfig, RuleConfig};
use crate::rewrite::error::RewriteError;
use crate::rewrite::filter::{ConfigFilter, NeverSkip, SkipPredicate};
use crate::rewrite::pattern::{self, CompiledPattern};
use crate::rewrite::template::Template;

/// A source pattern and the destination it rewrites to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub source: String,
    pub destination: String,
}

impl Rule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl From<&RuleConfig> for Rule {
    fn from(config: &RuleConfig) -> Self {
        Rule::new(config.from.clone(), config.to.clone())
    }
}

/// A rule with its pattern compiled and its destination parsed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    pattern: CompiledPattern,
    template: Template,
}

impl CompiledRule {
    /// Compile a rule, checking that every capture reference in the
    /// destination is provided by the source pattern.
    pub fn compile(rule: Rule) -> Result<Self, RewriteError> {
        let pattern = pattern::compile(&rule.source)?;
        let template = Template::parse(&rule.destination);

        let available = pattern.capture_count();
        if let Some(index) = template.references().find(|&i| i == 0 || i > available) {
            return Err(RewriteError::CaptureOutOfRange {
                pattern: rule.source.clone(),
                destination: rule.destination.clone(),
                index,
                available,
            });
        }

        Ok(Self {
            rule,
            pattern,
            template,
        })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Rewrite `path` if it matches this rule.
    pub fn apply(&self, path: &str) -> Option<String> {
        let captures = self.pattern.captures(path)?;
        Some(self.template.expand(&captures))
    }
}

/// Result of evaluating a path against the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite<'a> {
    /// A rule matched; `rule` is its position in evaluation order.
    Matched { path: String, rule: usize },
    /// No rule matched; the original path stands.
    Unmatched(&'a str),
}

impl Rewrite<'_> {
    /// The effective path after rewriting.
    pub fn path(&self) -> &str {
        match self {
            Rewrite::Matched { path, .. } => path.as_str(),
            Rewrite::Unmatched(path) => path,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Rewrite::Matched { .. })
    }
}

/// Ordered, compiled rule set plus the skip predicate.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    rules: Vec<CompiledRule>,
    filter: Arc<dyn SkipPredicate>,
}

impl RewriteEngine {
    /// Compile `rules` in the order given. Rewriting is never skipped.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RewriteError> {
        Self::with_filter(rules, Arc::new(NeverSkip))
    }

    /// Compile `rules` in the order given, consulting `filter` per request.
    pub fn with_filter(
        rules: impl IntoIterator<Item = Rule>,
        filter: Arc<dyn SkipPredicate>,
    ) -> Result<Self, RewriteError> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules, filter })
    }

    /// Compile rules from an unordered mapping.
    ///
    /// Entries are sorted by source pattern so the evaluation order does not
    /// depend on the map's iteration order.
    pub fn from_map<I, K, V>(map: I) -> Result<Self, RewriteError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut rules: Vec<Rule> = map.into_iter().map(|(k, v)| Rule::new(k, v)).collect();
        rules.sort_by(|a, b| a.source.cmp(&b.source));
        Self::new(rules)
    }

    /// Build the engine described by a gateway configuration: its rules in
    /// declaration order and its `[filter]` section.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RewriteError> {
        let filter = ConfigFilter::from_config(&config.filter);
        let filter: Arc<dyn SkipPredicate> = if filter.is_empty() {
            Arc::new(NeverSkip)
        } else {
            Arc::new(filter)
        };
        Self::with_filter(config.rules.iter().map(Rule::from), filter)
    }

    pub fn builder() -> RewriteEngineBuilder {
        RewriteEngineBuilder::default()
    }

    /// Compiled rules in evaluation order.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns true if `req` should bypass rewriting.
    pub fn should_skip(&self, req: &Request<Body>) -> bool {
        self.filter.should_skip(req)
    }

    /// Rewrite `path` using the first matching rule.
    pub fn apply<'a>(&self, path: &'a str) -> Rewrite<'a> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(rule, compiled)| {
                compiled
                    .apply(path)
                    .map(|path| Rewrite::Matched { path, rule })
            })
            .unwrap_or(Rewrite::Unmatched(path))
    }
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            filter: Arc::new(NeverSkip),
        }
    }
}

/// Collects rules in declaration order before compiling them.
#[derive(Debug, Default)]
pub struct RewriteEngineBuilder {
    rules: Vec<Rule>,
    filter: Option<Arc<dyn SkipPredicate>>,
}

impl RewriteEngineBuilder {
    pub fn rule(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.rules.push(Rule::new(source, destination));
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn filter(mut self, filter: impl SkipPredicate + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn build(self) -> Result<RewriteEngine, RewriteError> {
        let filter = self.filter.unwrap_or_else(|| Arc::new(NeverSkip));
        RewriteEngine::with_filter(self.rules, filter)
    }
}
