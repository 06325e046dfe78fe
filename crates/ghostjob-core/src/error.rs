//! Error types for the ghostjob-core library.
//!
//! Poorly parsed content is not an error. Extraction reports it through
//! confidence scores and the `low_confidence` flag on the record metadata;
//! only structurally invalid calls surface here.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the ghostjob library.
#[derive(Error, Debug)]
pub enum GhostJobError {
    /// Job extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Scoring error.
    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),

    /// Correction learning error.
    #[error("learning error: {0}")]
    Learning(#[from] LearningError),

    /// Duplicate detection error.
    #[error("dedup error: {0}")]
    Dedup(#[from] DedupError),

    /// Uploaded document error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to job extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No registered parser accepted the source, not even the fallback.
    #[error("no parser accepts source: {url}")]
    UnsupportedSource { url: String },

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors related to ghost probability scoring.
#[derive(Error, Debug)]
pub enum ScoringError {
    /// Job data is missing required structural fields.
    #[error("invalid job data: {0}")]
    InvalidInput(String),

    /// Job data could not be deserialized.
    #[error("malformed job data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to the correction store.
#[derive(Error, Debug)]
pub enum LearningError {
    /// The correction itself is malformed.
    #[error("invalid correction: {0}")]
    InvalidCorrection(String),

    /// No correction with this id exists under the key.
    #[error("correction not found: {0}")]
    NotFound(Uuid),

    /// The backing store failed.
    #[error("correction store failure: {0}")]
    Store(String),

    /// I/O error in a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Store contents could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to duplicate groups.
#[derive(Error, Debug)]
pub enum DedupError {
    /// A group member was not supplied to the operation.
    #[error("group member {0} not found among supplied records")]
    MissingMember(Uuid),

    /// The group has no members.
    #[error("duplicate group is empty")]
    EmptyGroup,
}

/// Errors related to uploaded documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The document carries no extractable text (e.g. a scanned image).
    #[error("document contains no extractable text")]
    NoText,

    /// Neither PDF nor UTF-8 text.
    #[error("unsupported document format")]
    UnsupportedFormat,
}

/// Result type for the ghostjob library.
pub type Result<T> = std::result::Result<T, GhostJobError>;
