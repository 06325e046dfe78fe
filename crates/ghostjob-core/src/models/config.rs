//! Configuration structures for the extraction and scoring pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the ghostjob pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostJobConfig {
    /// Extraction and registry quality configuration.
    pub extraction: ExtractionConfig,

    /// Correction learning configuration.
    pub learning: LearningConfig,

    /// Duplicate detection configuration.
    pub dedup: DedupConfig,

    /// Ghost probability scoring calibration.
    pub scoring: ScoringConfig,
}

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum overall record confidence.
    pub min_overall_confidence: f32,

    /// Minimum title confidence.
    pub min_title_confidence: f32,

    /// Minimum company confidence.
    pub min_company_confidence: f32,

    /// Minimum title length in characters.
    pub min_title_length: usize,

    /// Minimum company length in characters.
    pub min_company_length: usize,

    /// How much a later strategy must beat an earlier one to replace a field.
    pub overwrite_margin: f32,

    /// Ceiling for values guessed from the URL.
    pub url_fallback_confidence_cap: f32,

    /// Descriptions longer than this are truncated (0 = unlimited).
    pub max_description_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_overall_confidence: 0.6,
            min_title_confidence: 0.7,
            min_company_confidence: 0.7,
            min_title_length: 3,
            min_company_length: 2,
            overwrite_margin: 0.1,
            url_fallback_confidence_cap: 0.4,
            max_description_chars: 20_000,
        }
    }
}

/// Correction learning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// JSON file backing the correction store (in-memory when unset).
    pub store_path: Option<PathBuf>,

    /// Half-life of unverified corrections, in days (0 = no decay).
    pub unverified_half_life_days: f32,

    /// Fields below this confidence may borrow from similar postings.
    pub weak_field_threshold: f32,

    /// Minimum confidence of a reference field worth borrowing.
    pub strong_field_threshold: f32,

    /// Company similarity needed to treat two postings as the same employer.
    pub company_similarity: f32,

    /// Title similarity needed to borrow a title.
    pub title_similarity: f32,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            unverified_half_life_days: 180.0,
            weak_field_threshold: 0.6,
            strong_field_threshold: 0.8,
            company_similarity: 0.85,
            title_similarity: 0.8,
        }
    }
}

/// Duplicate detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum company similarity for content and contextual matches.
    pub company_similarity: f32,

    /// Minimum title similarity for content and contextual matches.
    pub title_similarity: f32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            company_similarity: 0.8,
            title_similarity: 0.7,
        }
    }
}

/// Scoring weights and thresholds.
///
/// Defaults are an initial calibration from published ghost-job heuristics,
/// not a model fitted to labelled data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Postings older than this many days are stale.
    pub stale_after_days: i64,

    /// Exception roles are tolerated up to this age.
    pub exception_max_age_days: i64,

    /// Postings at most this old count as recent.
    pub recent_within_days: i64,

    /// Risk added for a stale posting.
    pub stale_weight: f32,

    /// Risk added when only a job board carries the posting.
    pub job_board_only_weight: f32,

    /// Risk added for talent-pipeline language.
    pub pipeline_language_weight: f32,

    /// Descriptions shorter than this are considered minimal.
    pub min_description_chars: usize,

    /// Risk added for a minimal description.
    pub short_description_weight: f32,

    /// Distinct technologies needed to count as specific requirements.
    pub min_technical_terms: usize,

    /// Risk added for urgency language in the title.
    pub urgency_weight: f32,

    /// Titles longer than this are suspicious.
    pub max_title_chars: usize,

    /// Risk added for an overlong title.
    pub long_title_weight: f32,

    /// Risk added for staffing or consulting companies.
    pub staffing_weight: f32,

    /// Risk added for anonymized company identifiers.
    pub anonymous_company_weight: f32,

    /// Key factors needed for the positive adjustment.
    pub positive_factor_threshold: usize,

    /// Amount subtracted by the positive adjustment.
    pub positive_adjustment: f32,

    /// Probability at or above which risk is high.
    pub high_risk_threshold: f32,

    /// Probability at or above which risk is medium.
    pub medium_risk_threshold: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stale_after_days: 45,
            exception_max_age_days: 90,
            recent_within_days: 30,
            stale_weight: 0.20,
            job_board_only_weight: 0.15,
            pipeline_language_weight: 0.25,
            min_description_chars: 200,
            short_description_weight: 0.10,
            min_technical_terms: 3,
            urgency_weight: 0.25,
            max_title_chars: 60,
            long_title_weight: 0.10,
            staffing_weight: 0.15,
            anonymous_company_weight: 0.20,
            positive_factor_threshold: 3,
            positive_adjustment: 0.15,
            high_risk_threshold: 0.6,
            medium_risk_threshold: 0.35,
        }
    }
}

impl GhostJobConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: GhostJobConfig =
            serde_json::from_str(r#"{"scoring": {"stale_after_days": 60}}"#).unwrap();
        assert_eq!(config.scoring.stale_after_days, 60);
        assert_eq!(config.scoring.urgency_weight, 0.25);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = GhostJobConfig::default();
        config.dedup.title_similarity = 0.75;
        config.save(&path).unwrap();

        let loaded = GhostJobConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
