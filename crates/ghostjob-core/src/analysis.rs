//! End-to-end analysis: extraction, duplicate detection and scoring.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dedup::{DuplicateDetector, DuplicateGroup, DuplicateMatch, group_from_matches};
use crate::error::Result;
use crate::learning::{CorrectionLearningService, JsonFileCorrectionStore};
use crate::models::config::GhostJobConfig;
use crate::models::job::{NormalizedJobRecord, RawSource};
use crate::models::score::{JobData, ScoreResult};
use crate::registry::ParserRegistry;
use crate::scoring::{ALGORITHM_VERSION, ScoredPosting, ScoringEngine};

/// One posting to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// URL the content was fetched from.
    pub url: String,
    /// Already-fetched content.
    pub raw: RawSource,
    /// Posting date supplied by the caller; wins over a date found in the content.
    pub posted_at: Option<DateTime<Utc>>,
    /// Reference time for recency rules (defaults to now).
    pub reference_time: Option<DateTime<Utc>>,
}

impl AnalysisRequest {
    pub fn new(raw: RawSource) -> Self {
        Self {
            url: raw.url.clone(),
            raw,
            posted_at: None,
            reference_time: None,
        }
    }

    /// Analyze the content as if fetched from `url`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_posted_at(mut self, posted_at: DateTime<Utc>) -> Self {
        self.posted_at = Some(posted_at);
        self
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }
}

/// What storage should do with the analyzed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "canonical_id", rename_all = "snake_case")]
pub enum Disposition {
    /// No duplicate among the candidates.
    StoreAsNew,
    /// Merge into the duplicate group whose canonical member is this id.
    MergeInto(Uuid),
}

/// Result of analyzing one posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAnalysis {
    /// Extracted record after learning.
    pub record: NormalizedJobRecord,

    /// Matches against the candidate pool, strongest first.
    pub duplicates: Vec<DuplicateMatch>,

    /// Duplicate group the record joined, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<DuplicateGroup>,

    pub disposition: Disposition,

    /// Ghost score; absent when there was nothing real to score.
    pub score: Option<ScoreResult>,

    /// Remarks about degraded input.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,

    pub processing_time_ms: u64,
    pub algorithm_version: String,
}

impl JobAnalysis {
    /// History entry for statistics, when the posting was scored.
    pub fn to_scored_posting(&self) -> Option<ScoredPosting> {
        let score = self.score.as_ref()?;
        Some(ScoredPosting {
            company: self.record.company().to_string(),
            platform: self.record.platform,
            ghost_probability: score.ghost_probability,
            risk_level: score.risk_level,
            analyzed_at: self.record.metadata.extracted_at,
        })
    }
}

/// Runs the full pipeline for single postings.
pub struct GhostJobAnalyzer {
    registry: ParserRegistry,
    learning: Option<Arc<CorrectionLearningService>>,
    detector: DuplicateDetector,
    engine: ScoringEngine,
    remember_contextual: bool,
}

impl GhostJobAnalyzer {
    /// Analyzer with default parsers and thresholds and no learning.
    pub fn new() -> Self {
        Self {
            registry: ParserRegistry::with_defaults(),
            learning: None,
            detector: DuplicateDetector::new(),
            engine: ScoringEngine::new(),
            remember_contextual: false,
        }
    }

    /// Build every component from configuration. A configured correction
    /// store path enables learning backed by that file.
    pub fn from_config(config: &GhostJobConfig) -> Result<Self> {
        let mut analyzer = Self {
            registry: ParserRegistry::with_defaults().with_config(config.extraction.clone()),
            learning: None,
            detector: DuplicateDetector::new().with_config(config.dedup.clone()),
            engine: ScoringEngine::new().with_config(config.scoring.clone()),
            remember_contextual: false,
        };

        if let Some(path) = &config.learning.store_path {
            let store = JsonFileCorrectionStore::open(path)?;
            let learning =
                CorrectionLearningService::new(Arc::new(store)).with_config(config.learning.clone());
            analyzer = analyzer.with_learning(Arc::new(learning));
        }
        Ok(analyzer)
    }

    /// Refine records with learned corrections and similar postings.
    pub fn with_learning(mut self, learning: Arc<CorrectionLearningService>) -> Self {
        self.registry = self.registry.with_learning(Arc::clone(&learning));
        self.learning = Some(learning);
        self
    }

    /// Replace the parser registry. Learning already attached to the
    /// analyzer is attached to the new registry too.
    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = match &self.learning {
            Some(learning) => registry.with_learning(Arc::clone(learning)),
            None => registry,
        };
        self
    }

    pub fn with_detector(mut self, detector: DuplicateDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_engine(mut self, engine: ScoringEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Store values borrowed from similar postings as contextual corrections.
    pub fn remember_contextual(mut self, enabled: bool) -> Self {
        self.remember_contextual = enabled;
        self
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Analyze one posting against previously stored candidates.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        candidates: &[NormalizedJobRecord],
    ) -> Result<JobAnalysis> {
        let start = Instant::now();
        let mut notes = Vec::new();

        let mut record = self.registry.parse_job(&request.url, &request.raw)?;

        if let Some(learning) = &self.learning {
            if !candidates.is_empty() {
                let (refined, borrowed) = learning.learn_from_similar_postings(&record, candidates);
                if !borrowed.is_empty() {
                    if self.remember_contextual {
                        let stored = learning.persist_contextual(&record, &refined)?;
                        debug!("Stored {} contextual corrections", stored.len());
                    }
                    record = refined;
                }
            }
        }

        let duplicates = self.detector.detect_duplicates(&record, candidates);
        let group = group_from_matches(&record, candidates, &duplicates);
        let disposition = match &group {
            Some(group) => Disposition::MergeInto(group.canonical_id),
            None => Disposition::StoreAsNew,
        };

        let score = if !record.fields.title.is_present() && !record.fields.company.is_present() {
            warn!("No title or company extracted from {}; not scoring", request.url);
            notes.push(
                "Neither title nor company could be extracted; the posting was not scored"
                    .to_string(),
            );
            None
        } else {
            let mut job = JobData::from_record(&record);
            job.mirror_urls = duplicates
                .iter()
                .filter_map(|m| candidates.iter().find(|c| c.id == m.candidate_id))
                .map(|c| c.source_url.clone())
                .filter(|u| !u.is_empty())
                .collect();

            let posted_at = request.posted_at.or(record.posted_at());
            let now = request.reference_time.unwrap_or_else(Utc::now);
            Some(self.engine.score_at(&job, posted_at, now)?)
        };

        if record.metadata.low_confidence {
            notes.push(format!(
                "Low-confidence extraction: {}",
                record.metadata.quality_issues.join(", ")
            ));
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Analyzed {} in {} ms: {:?}, score {}",
            request.url,
            processing_time_ms,
            disposition,
            score
                .as_ref()
                .map(|s| format!("{:.3} ({})", s.ghost_probability, s.risk_level))
                .unwrap_or_else(|| "skipped".to_string())
        );

        Ok(JobAnalysis {
            record,
            duplicates,
            group,
            disposition,
            score,
            notes,
            processing_time_ms,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        })
    }
}

impl Default for GhostJobAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::MatchMethod;
    use crate::models::score::RiskLevel;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const POSTING: &str = r#"<html><head>
        <script type="application/ld+json">{
          "@context": "https://schema.org",
          "@type": "JobPosting",
          "title": "URGENT: Hiring NOW",
          "hiringOrganization": {"@type": "Organization", "name": "ABC Staffing Solutions"},
          "jobLocation": {"@type": "Place", "address": {"addressLocality": "Denver"}},
          "description": "Great opportunity, send your resume to us today!!",
          "datePosted": "2024-04-01"
        }</script></head><body><h1>URGENT: Hiring NOW</h1></body></html>"#;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 8, 0, 0).unwrap()
    }

    fn request(url: &str) -> AnalysisRequest {
        let raw = RawSource::new(url, POSTING).with_fetched_at(fetched());
        AnalysisRequest::new(raw).with_reference_time(fetched())
    }

    #[test]
    fn test_new_posting_is_scored_and_stored() {
        let analysis = GhostJobAnalyzer::new()
            .analyze(&request("https://www.example.com/jobs/1"), &[])
            .unwrap();

        assert_eq!(analysis.record.company(), "ABC Staffing Solutions");
        assert_eq!(analysis.disposition, Disposition::StoreAsNew);
        assert!(analysis.duplicates.is_empty());

        let score = analysis.score.unwrap();
        assert_eq!(score.risk_level, RiskLevel::High);
        assert!(score.risk_factors.iter().any(|f| f.label == "stale_posting"));
        assert_eq!(analysis.algorithm_version, ALGORITHM_VERSION);
    }

    #[test]
    fn test_explicit_posting_date_wins() {
        let req = request("https://www.example.com/jobs/1").with_posted_at(fetched());
        let analysis = GhostJobAnalyzer::new().analyze(&req, &[]).unwrap();

        let score = analysis.score.unwrap();
        assert!(!score.risk_factors.iter().any(|f| f.label == "stale_posting"));
        assert!(score.key_factors.iter().any(|f| f.label == "recent_posting"));
    }

    #[test]
    fn test_tracking_variant_merges_into_existing() {
        let analyzer = GhostJobAnalyzer::new();
        let existing = analyzer
            .analyze(&request("https://www.example.com/jobs/1"), &[])
            .unwrap()
            .record;

        let analysis = analyzer
            .analyze(
                &request("https://www.example.com/jobs/1?utm_source=newsletter"),
                std::slice::from_ref(&existing),
            )
            .unwrap();

        assert_eq!(analysis.duplicates.len(), 1);
        assert_eq!(analysis.duplicates[0].method, MatchMethod::CanonicalUrl);
        assert!(matches!(analysis.disposition, Disposition::MergeInto(_)));
        assert_eq!(analysis.group.map(|g| g.members.len()), Some(2));
    }

    #[test]
    fn test_unreadable_content_is_not_scored() {
        let raw = RawSource::new("", "???").with_fetched_at(fetched());
        let analysis = GhostJobAnalyzer::new()
            .analyze(&AnalysisRequest::new(raw), &[])
            .unwrap();

        assert!(analysis.score.is_none());
        assert!(analysis.record.metadata.low_confidence);
        assert_eq!(analysis.notes.len(), 2);
        assert!(analysis.to_scored_posting().is_none());
    }
}
