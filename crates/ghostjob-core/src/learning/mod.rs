//! Correction learning: user and contextual fixes applied to later parses.

mod service;
mod store;

pub use service::CorrectionLearningService;
pub use store::{CorrectionStore, InMemoryCorrectionStore, JsonFileCorrectionStore};

use crate::error::LearningError;

/// Result type for correction learning.
pub type Result<T> = std::result::Result<T, LearningError>;
