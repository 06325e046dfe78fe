//! Ghost probability scoring models.

use serde::{Deserialize, Serialize};

use super::job::{NormalizedJobRecord, is_placeholder};

/// Job fields consumed by the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    /// Job title.
    #[serde(default)]
    pub title: String,

    /// Company name.
    #[serde(default)]
    pub company: String,

    /// Full description text.
    #[serde(default)]
    pub description: String,

    /// Location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// URL the posting was found at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Other URLs where the same posting is mirrored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mirror_urls: Vec<String>,
}

impl JobData {
    /// Create job data from the three required fields.
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the posting URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a mirror URL.
    pub fn with_mirror(mut self, url: impl Into<String>) -> Self {
        self.mirror_urls.push(url.into());
        self
    }

    /// Build from a normalized record. Placeholders become empty strings.
    pub fn from_record(record: &NormalizedJobRecord) -> Self {
        let real = |value: &str| {
            if is_placeholder(value) {
                String::new()
            } else {
                value.to_string()
            }
        };

        Self {
            title: real(record.title()),
            company: real(record.company()),
            description: record.description().unwrap_or_default().to_string(),
            location: record.location().map(str::to_string),
            url: Some(record.source_url.clone()).filter(|u| !u.is_empty()),
            mirror_urls: Vec::new(),
        }
    }
}

/// Risk classification derived from the ghost probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring category a factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    Recency,
    CompanySite,
    Language,
    Title,
    Company,
}

/// A signal that raises ghost probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Category.
    pub category: FactorCategory,
    /// Short label.
    pub label: String,
    /// Human-readable rationale.
    pub rationale: String,
    /// Contribution to the score (positive).
    pub weight: f32,
}

/// A signal of genuine hiring intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    /// Category.
    pub category: FactorCategory,
    /// Short label.
    pub label: String,
    /// Human-readable rationale.
    pub rationale: String,
    /// Share of the positive adjustment (zero or negative).
    pub weight: f32,
}

/// Outcome of one scoring invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Probability the posting is a ghost job (0.0 - 1.0).
    pub ghost_probability: f32,

    /// Classification of the probability.
    pub risk_level: RiskLevel,

    /// Confidence in the classification.
    pub confidence: f32,

    /// Triggered risk factors.
    pub risk_factors: Vec<RiskFactor>,

    /// Recorded positive factors.
    pub key_factors: Vec<KeyFactor>,

    /// Whether the positive adjustment was subtracted.
    pub positive_adjustment_applied: bool,

    /// Version of the heuristics that produced the score.
    pub algorithm_version: String,
}

impl ScoreResult {
    /// Sum of risk factor weights before adjustment and clamping.
    pub fn total_risk(&self) -> f32 {
        self.risk_factors.iter().map(|f| f.weight).sum()
    }
}
