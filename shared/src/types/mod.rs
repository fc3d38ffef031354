//! Input record definitions

pub mod markers;
pub mod trace;
