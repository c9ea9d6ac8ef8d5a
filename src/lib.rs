//! Embedly API client and scenario runner
//!
//! This library provides an async client for the Embedly API and a
//! runner for feature files that exercise it with plain-English steps.

pub mod api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use api::{Api, ApiMethod, Options};
pub use common::{Error, Result};
