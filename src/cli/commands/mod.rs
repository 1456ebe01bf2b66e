//! Command implementations of the helper binaries

pub mod config;
pub mod plugins;
