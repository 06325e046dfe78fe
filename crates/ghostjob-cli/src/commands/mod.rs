//! Subcommands.

pub mod analyze;
pub mod batch;
pub mod config;
pub mod corrections;
pub mod score;
