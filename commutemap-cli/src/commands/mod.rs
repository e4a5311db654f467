//! CLI command implementations.

pub mod config;
pub mod fetch;
pub mod replay;
pub mod tile;
