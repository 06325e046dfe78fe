//! Job posting data models: raw sources, extraction fields and normalized records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::platform::Platform;

/// Placeholder title used when no title could be extracted.
pub const UNKNOWN_POSITION: &str = "Unknown Position";

/// Placeholder company used when no company could be extracted.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Check whether a value is one of the known placeholders.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case(UNKNOWN_POSITION) || value.eq_ignore_ascii_case(UNKNOWN_COMPANY)
}

/// Shape of the fetched content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// HTML markup from a web page.
    Html,
    /// Plain text, e.g. from an uploaded document.
    Text,
}

impl ContentKind {
    /// Guess the content kind by looking for markup.
    pub fn detect(content: &str) -> Self {
        let head: String = content.trim_start().chars().take(512).collect::<String>().to_lowercase();
        if head.starts_with('<')
            || head.contains("<html")
            || head.contains("<body")
            || head.contains("<div")
            || head.contains("<script")
        {
            ContentKind::Html
        } else {
            ContentKind::Text
        }
    }
}

/// Already-fetched content plus its originating URL.
///
/// Owned by the caller and borrowed by parsers; the core never persists it.
#[derive(Debug, Clone)]
pub struct RawSource {
    /// Originating URL (may be empty for uploaded documents).
    pub url: String,
    /// Raw markup or text.
    pub content: String,
    /// Platform detected from the URL.
    pub platform: Platform,
    /// Whether the content is markup or plain text.
    pub kind: ContentKind,
    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl RawSource {
    /// Create a raw source, detecting platform and content kind.
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        let url = url.into();
        let content = content.into();
        Self {
            platform: Platform::detect(&url),
            kind: ContentKind::detect(&content),
            url,
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Set the fetch timestamp.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }

    /// Force the content kind.
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }
}

/// One of the normalized job fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobField {
    Title,
    Company,
    Location,
    Description,
}

impl JobField {
    /// All fields in extraction order.
    pub const ALL: [JobField; 4] = [
        JobField::Title,
        JobField::Company,
        JobField::Location,
        JobField::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Company => "company",
            JobField::Location => "location",
            JobField::Description => "description",
        }
    }

    /// Weight of the field in the overall record confidence.
    pub fn weight(&self) -> f32 {
        match self {
            JobField::Title => 0.35,
            JobField::Company => 0.35,
            JobField::Description => 0.20,
            JobField::Location => 0.10,
        }
    }
}

impl std::fmt::Display for JobField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" | "job_title" => Ok(JobField::Title),
            "company" | "company_name" => Ok(JobField::Company),
            "location" => Ok(JobField::Location),
            "description" => Ok(JobField::Description),
            other => Err(format!("unknown job field: {}", other)),
        }
    }
}

/// Provenance of an extracted value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Embedded schema.org JobPosting record.
    StructuredData,
    /// Element selected by structural role.
    Layout,
    /// Regex heuristics over visible text or URL slugs.
    TextPattern,
    /// Guessed from the URL host or path.
    UrlDerived,
    /// A learned correction.
    Correction,
    /// Borrowed from a similar posting.
    CrossReference,
    /// Filled in from a duplicate group member.
    Merged,
    /// Explicit "unknown" placeholder.
    Placeholder,
    /// Nothing was found.
    #[default]
    Absent,
}

/// A single extracted field with confidence and provenance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionField {
    /// Extracted value.
    pub value: Option<String>,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Which strategy produced the value.
    pub source: FieldSource,
}

impl ExtractionField {
    /// Create a field, clamping confidence and dropping blank values.
    pub fn new(value: impl Into<String>, confidence: f32, source: FieldSource) -> Self {
        let value = value.into().trim().to_string();
        let confidence = clamp_confidence(confidence);

        if value.is_empty() || (confidence <= 0.0 && !is_placeholder(&value)) {
            return Self::absent();
        }

        Self {
            value: Some(value),
            confidence,
            source,
        }
    }

    /// A field with no value.
    pub fn absent() -> Self {
        Self::default()
    }

    /// An explicit placeholder value at zero confidence.
    pub fn placeholder(text: &str) -> Self {
        Self {
            value: Some(text.to_string()),
            confidence: 0.0,
            source: FieldSource::Placeholder,
        }
    }

    /// Borrow the value.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether the field carries a real (non-placeholder) value.
    pub fn is_present(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !is_placeholder(v))
    }

    /// Whether the field holds a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.value.as_deref().is_some_and(is_placeholder)
    }
}

/// Clamp a confidence into [0, 1], mapping NaN to 0.
pub fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// The four job fields plus structured extras.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: ExtractionField,
    pub company: ExtractionField,
    pub location: ExtractionField,
    pub description: ExtractionField,
    /// Posting date when the source declares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl ExtractedFields {
    /// Borrow a field.
    pub fn get(&self, field: JobField) -> &ExtractionField {
        match field {
            JobField::Title => &self.title,
            JobField::Company => &self.company,
            JobField::Location => &self.location,
            JobField::Description => &self.description,
        }
    }

    /// Mutably borrow a field.
    pub fn get_mut(&mut self, field: JobField) -> &mut ExtractionField {
        match field {
            JobField::Title => &mut self.title,
            JobField::Company => &mut self.company,
            JobField::Location => &mut self.location,
            JobField::Description => &mut self.description,
        }
    }

    /// Replace a field.
    pub fn set(&mut self, field: JobField, value: ExtractionField) {
        *self.get_mut(field) = value;
    }

    /// Whether no field carries a value.
    pub fn is_empty(&self) -> bool {
        JobField::ALL.iter().all(|f| self.get(*f).value.is_none())
    }

    /// Merge fields from a lower-priority strategy.
    ///
    /// A present field is only replaced when the incoming confidence exceeds
    /// it by more than `margin`. Returns the fields that were taken.
    pub fn merge_from(&mut self, other: &ExtractedFields, margin: f32) -> Vec<JobField> {
        let mut taken = Vec::new();

        for field in JobField::ALL {
            let incoming = other.get(field);
            if incoming.value.is_none() {
                continue;
            }

            let current = self.get(field);
            let take = if current.value.is_none() || current.is_placeholder() {
                true
            } else {
                incoming.confidence > current.confidence + margin
            };

            if take {
                self.set(field, incoming.clone());
                taken.push(field);
            }
        }

        if self.posted_at.is_none() {
            self.posted_at = other.posted_at;
        }

        taken
    }

    /// Weighted overall confidence; title and company weigh the most.
    pub fn overall_confidence(&self) -> f32 {
        let score: f32 = JobField::ALL
            .iter()
            .map(|f| f.weight() * self.get(*f).confidence)
            .sum();
        clamp_confidence(score)
    }

    /// Count of fields holding real values.
    pub fn completeness(&self) -> usize {
        JobField::ALL.iter().filter(|f| self.get(**f).is_present()).count()
    }
}

/// Metadata about the extraction process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Parser that produced the record.
    pub parser_name: String,

    /// Parser version.
    pub parser_version: String,

    /// Strategy that supplied the first field found.
    pub strategy: FieldSource,

    /// When the underlying content was fetched.
    pub extracted_at: DateTime<Utc>,

    /// Whether the registry fell back to the generic parser.
    #[serde(default)]
    pub fallback_used: bool,

    /// Set when the record failed quality validation.
    #[serde(default)]
    pub low_confidence: bool,

    /// Quality thresholds the record did not meet.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_issues: Vec<String>,

    /// Descriptions of learned corrections applied to the record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_improvements: Vec<String>,

    /// Warnings encountered during extraction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A merged, normalized job record for one raw source.
///
/// Records are never edited in place once emitted; revisions go through
/// [`NormalizedJobRecord::revised`], which bumps `version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJobRecord {
    /// Stable identifier derived from the source URL.
    pub id: Uuid,

    /// Revision counter; 1 for a fresh extraction.
    pub version: u32,

    /// Extracted fields.
    pub fields: ExtractedFields,

    /// Weighted overall confidence (0.0 - 1.0).
    pub confidence: f32,

    /// URL the posting was read from.
    pub source_url: String,

    /// URL with tracking parameters and volatile segments removed.
    pub canonical_url: String,

    /// Platform detected from the source URL.
    pub platform: Platform,

    /// Extraction metadata.
    pub metadata: ExtractionMetadata,
}

impl NormalizedJobRecord {
    /// Title, or the placeholder.
    pub fn title(&self) -> &str {
        self.fields.title.as_str().unwrap_or(UNKNOWN_POSITION)
    }

    /// Company, or the placeholder.
    pub fn company(&self) -> &str {
        self.fields.company.as_str().unwrap_or(UNKNOWN_COMPANY)
    }

    /// Location if known.
    pub fn location(&self) -> Option<&str> {
        self.fields.location.as_str()
    }

    /// Description if known.
    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_str()
    }

    /// Declared posting date if known.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.fields.posted_at
    }

    /// Count of fields holding real values.
    pub fn completeness(&self) -> usize {
        self.fields.completeness()
    }

    /// Recompute the overall confidence from the fields.
    pub fn recompute_confidence(&mut self) {
        self.confidence = self.fields.overall_confidence();
    }

    /// A copy to be edited as the next revision.
    pub fn revised(&self) -> Self {
        let mut next = self.clone();
        next.version = self.version.saturating_add(1);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_confidence_is_clamped() {
        let field = ExtractionField::new("Engineer", 1.7, FieldSource::Layout);
        assert_eq!(field.confidence, 1.0);

        let field = ExtractionField::new("Engineer", f32::NAN, FieldSource::Layout);
        assert_eq!(field.value, None);
        assert_eq!(field.confidence, 0.0);
    }

    #[test]
    fn test_zero_confidence_drops_real_values() {
        let field = ExtractionField::new("Acme", 0.0, FieldSource::TextPattern);
        assert_eq!(field.value, None);

        let field = ExtractionField::placeholder(UNKNOWN_COMPANY);
        assert!(field.is_placeholder());
        assert!(!field.is_present());
    }

    #[test]
    fn test_merge_respects_margin() {
        let mut fields = ExtractedFields {
            title: ExtractionField::new("Backend Engineer", 0.8, FieldSource::Layout),
            ..Default::default()
        };
        let other = ExtractedFields {
            title: ExtractionField::new("Engineer", 0.85, FieldSource::TextPattern),
            company: ExtractionField::new("Acme", 0.4, FieldSource::TextPattern),
            ..Default::default()
        };

        let taken = fields.merge_from(&other, 0.1);

        assert_eq!(taken, vec![JobField::Company]);
        assert_eq!(fields.title.as_str(), Some("Backend Engineer"));
        assert_eq!(fields.company.as_str(), Some("Acme"));
    }

    #[test]
    fn test_merge_replaces_placeholder() {
        let mut fields = ExtractedFields {
            company: ExtractionField::placeholder(UNKNOWN_COMPANY),
            ..Default::default()
        };
        let other = ExtractedFields {
            company: ExtractionField::new("Acme", 0.3, FieldSource::UrlDerived),
            ..Default::default()
        };

        fields.merge_from(&other, 0.1);
        assert_eq!(fields.company.as_str(), Some("Acme"));
    }

    #[test]
    fn test_overall_confidence_weights() {
        let fields = ExtractedFields {
            title: ExtractionField::new("Engineer", 1.0, FieldSource::StructuredData),
            company: ExtractionField::new("Acme", 1.0, FieldSource::StructuredData),
            ..Default::default()
        };
        assert!((fields.overall_confidence() - 0.70).abs() < 1e-6);
        assert_eq!(fields.completeness(), 2);
    }

    #[test]
    fn test_job_field_from_str() {
        assert_eq!("Company".parse::<JobField>(), Ok(JobField::Company));
        assert!("salary".parse::<JobField>().is_err());
    }

    #[test]
    fn test_content_kind_detection() {
        assert_eq!(ContentKind::detect("<html><body>x</body></html>"), ContentKind::Html);
        assert_eq!(ContentKind::detect("Job Title: Engineer"), ContentKind::Text);
    }
}
