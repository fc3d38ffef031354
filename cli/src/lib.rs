//! Library side of the `kernscope` command
//!
//! Split from `main.rs` so the report pipeline can be driven from tests.

pub mod commands;
pub mod config;
pub mod input;
pub mod output;
pub mod render;
