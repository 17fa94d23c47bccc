//! Core types and the merge engine for the Wicket venue aggregator.
//!
//! This crate is deliberately free of HTTP, filesystem, and logging
//! dependencies. Everything here is a pure function of its inputs; the I/O
//! collaborators (`wicket-store-json`, `wicket-remote`, `wicket-api`) depend on
//! it, never the other way round.

pub mod error;
pub mod lenient;
pub mod matcher;
pub mod merge;
pub mod rating;
pub mod similarity;
pub mod store;
pub mod venue;

pub use error::{Error, Result};
