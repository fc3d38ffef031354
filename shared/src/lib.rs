//! Shared types and utilities for kernscope
//!
//! This crate contains the per-launch records handed over by the trace
//! decoder, and small helpers used by both the classifier and the CLI.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{markers::*, trace::*};
