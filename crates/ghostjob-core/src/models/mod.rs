//! Data models.

pub mod config;
pub mod correction;
pub mod job;
pub mod platform;
pub mod score;
