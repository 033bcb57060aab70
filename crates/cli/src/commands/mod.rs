//! Subcommand implementations

pub mod dashboard;
pub mod debug;
pub mod metrics;
