//! Path rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Rule Compilation (at startup / reload):
//!     RuleConfig[] (declaration order)
//!     → pattern.rs (wildcard pattern → anchored regex + capture count)
//!     → template.rs (destination → literals + $N references)
//!     → engine.rs (check references, freeze as immutable RewriteEngine)
//!
//! Per Request:
//!     filter.rs (skip predicate) → skip? pass through
//!     → engine.rs (first matching rule wins)
//!     → template expansion with captures
//!     → Return: Matched(new path) or Unmatched(original path)
//! ```
//!
//! # Design Decisions
//! - `*` is the only wildcard; no user-facing regex
//! - All errors are configuration errors, raised before serving
//! - Matching is pure and synchronous: no I/O, no shared mutable state

pub mod engine;
pub mod error;
pub mod filter;
pub mod pattern;
pub mod template;

pub use engine::{CompiledRule, Rewrite, RewriteEngine, RewriteEngineBuilder, Rule};
pub use error::RewriteError;
pub use filter::{ConfigFilter, NeverSkip, SkipFn, SkipPredicate};
pub use pattern::{CaptureSet, CompiledPattern};
pub use template::Template;
