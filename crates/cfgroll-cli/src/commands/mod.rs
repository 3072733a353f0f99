//! CLI command implementations.

pub mod roll;
