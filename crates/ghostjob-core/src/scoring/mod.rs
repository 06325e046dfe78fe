//! Ghost-probability scoring.
//!
//! Five rule categories (recency, company-site verification, language cues,
//! title cues and company cues) add weighted risk. Concrete hiring details
//! are recorded as key factors; enough of them subtract a positive
//! adjustment. The result is clamped to [0, 1] and classified.

mod engine;
pub mod lexicon;
mod stats;

pub use engine::ScoringEngine;
pub use stats::{AnalysisStats, CompanyStats, ScoredPosting, TrendPoint};

/// Version tag reported with every score.
pub const ALGORITHM_VERSION: &str = "ghostjob-heuristics-1.0";
