//! Core library for job posting extraction and ghost job scoring.
//!
//! This crate provides:
//! - Multi-strategy field extraction (structured data, layout, text patterns)
//! - Platform source parsers behind a registry with quality fallback
//! - Correction learning from user and contextual fixes
//! - Cross-platform duplicate detection
//! - Rule-based ghost probability scoring
//! - Uploaded document ingestion (PDF, HTML, plain text)

pub mod analysis;
pub mod dedup;
pub mod document;
pub mod error;
pub mod extraction;
pub mod learning;
pub mod models;
pub mod parsers;
pub mod registry;
pub mod scoring;
pub mod similarity;

pub use analysis::{AnalysisRequest, Disposition, GhostJobAnalyzer, JobAnalysis};
pub use dedup::{DuplicateDetector, DuplicateGroup, DuplicateMatch, MatchMethod, canonicalize_url};
pub use document::DocumentExtractor;
pub use error::{GhostJobError, Result};
pub use learning::{CorrectionLearningService, CorrectionStore, InMemoryCorrectionStore, JsonFileCorrectionStore};
pub use models::config::GhostJobConfig;
pub use models::correction::{Correction, CorrectionPattern};
pub use models::job::{ExtractionField, JobField, NormalizedJobRecord, RawSource};
pub use models::platform::Platform;
pub use models::score::{JobData, RiskLevel, ScoreResult};
pub use registry::ParserRegistry;
pub use scoring::{AnalysisStats, ScoringEngine};
