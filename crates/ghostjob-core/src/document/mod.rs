//! Uploaded document ingestion.
//!
//! Turns PDF, HTML or plain-text bytes into a [`RawSource`](crate::models::job::RawSource)
//! the parser registry can consume.

mod extractor;

pub use extractor::{DocumentExtractor, DocumentFormat, discover_source_url};

use crate::error::DocumentError;

/// Result type for document ingestion.
pub type Result<T> = std::result::Result<T, DocumentError>;
