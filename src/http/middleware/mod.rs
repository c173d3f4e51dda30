//! Request middleware.

pub mod rewrite;
