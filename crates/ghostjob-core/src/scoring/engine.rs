//! Rule-based ghost probability scoring.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::ALGORITHM_VERSION;
use super::lexicon::{
    COMPENSATION, DEADLINE, EXCEPTION_COMPANY, EXCEPTION_TITLE, PIPELINE_LANGUAGE, STAFFING,
    TIMELINE, URGENCY, count_technical_terms, is_anonymous_company,
};
use crate::error::ScoringError;
use crate::models::config::ScoringConfig;
use crate::models::platform::Platform;
use crate::models::score::{FactorCategory, JobData, KeyFactor, RiskFactor, RiskLevel, ScoreResult};

/// Scores job postings for ghost-job likelihood.
///
/// Scoring is a pure function of the job data, the posting date and the
/// reference time; every triggered rule is reported with its rationale.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

#[derive(Default)]
struct Factors {
    risks: Vec<RiskFactor>,
    keys: Vec<KeyFactor>,
}

impl Factors {
    fn risk(&mut self, category: FactorCategory, label: &str, rationale: String, weight: f32) {
        debug!("Risk factor {} (+{:.2}): {}", label, weight, rationale);
        self.risks.push(RiskFactor {
            category,
            label: label.to_string(),
            rationale,
            weight,
        });
    }

    fn key(&mut self, category: FactorCategory, label: &str, rationale: String) {
        debug!("Key factor {}: {}", label, rationale);
        self.keys.push(KeyFactor {
            category,
            label: label.to_string(),
            rationale,
            weight: 0.0,
        });
    }
}

impl ScoringEngine {
    /// Create an engine with the default calibration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set weights and thresholds.
    pub fn with_config(mut self, config: ScoringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a posting relative to the current time.
    pub fn score(
        &self,
        job: &JobData,
        posted_at: Option<DateTime<Utc>>,
    ) -> Result<ScoreResult, ScoringError> {
        self.score_at(job, posted_at, Utc::now())
    }

    /// Score JSON-encoded job data.
    pub fn score_json(
        &self,
        json: &str,
        posted_at: Option<DateTime<Utc>>,
    ) -> Result<ScoreResult, ScoringError> {
        let job: JobData = serde_json::from_str(json)?;
        self.score(&job, posted_at)
    }

    /// Score a posting relative to `now`.
    pub fn score_at(
        &self,
        job: &JobData,
        posted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<ScoreResult, ScoringError> {
        if job.title.trim().is_empty() && job.company.trim().is_empty() {
            return Err(ScoringError::InvalidInput(
                "job data needs a title or a company".to_string(),
            ));
        }

        let mut factors = Factors::default();
        self.check_recency(job, posted_at, now, &mut factors);
        self.check_company_site(job, &mut factors);
        self.check_language(job, &mut factors);
        self.check_title(job, &mut factors);
        self.check_company(job, &mut factors);

        let mut score: f32 = factors.risks.iter().map(|f| f.weight).sum();
        let adjustment_applied = factors.keys.len() >= self.config.positive_factor_threshold;
        if adjustment_applied {
            score -= self.config.positive_adjustment;
            let share = -self.config.positive_adjustment / factors.keys.len() as f32;
            for key in &mut factors.keys {
                key.weight = share;
            }
        }

        let ghost_probability = round3(score.clamp(0.0, 1.0));
        let (risk_level, confidence) = self.classify(ghost_probability);

        info!(
            "Scored '{}' at '{}': {:.3} ({}), {} risk / {} key factors",
            job.title,
            job.company,
            ghost_probability,
            risk_level,
            factors.risks.len(),
            factors.keys.len()
        );

        Ok(ScoreResult {
            ghost_probability,
            risk_level,
            confidence,
            risk_factors: factors.risks,
            key_factors: factors.keys,
            positive_adjustment_applied: adjustment_applied,
            algorithm_version: ALGORITHM_VERSION.to_string(),
        })
    }

    /// Risk level and its confidence for a probability.
    pub fn classify(&self, probability: f32) -> (RiskLevel, f32) {
        if probability >= self.config.high_risk_threshold {
            (RiskLevel::High, 0.85)
        } else if probability >= self.config.medium_risk_threshold {
            (RiskLevel::Medium, 0.75)
        } else {
            (RiskLevel::Low, 0.80)
        }
    }

    fn check_recency(
        &self,
        job: &JobData,
        posted_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        factors: &mut Factors,
    ) {
        let Some(posted_at) = posted_at else {
            return;
        };
        let age = (now - posted_at).num_days().max(0);
        let config = &self.config;

        if age > config.stale_after_days {
            let exception = EXCEPTION_TITLE.is_match(&job.title)
                || EXCEPTION_COMPANY.is_match(&job.company);
            if exception && age <= config.exception_max_age_days {
                debug!("Posting is {} days old but exempt as a long-cycle role", age);
            } else {
                factors.risk(
                    FactorCategory::Recency,
                    "stale_posting",
                    format!("Posted {} days ago (over {} days)", age, config.stale_after_days),
                    config.stale_weight,
                );
            }
        } else if age <= config.recent_within_days {
            factors.key(
                FactorCategory::Recency,
                "recent_posting",
                format!("Posted {} days ago", age),
            );
        }
    }

    fn check_company_site(&self, job: &JobData, factors: &mut Factors) {
        let platforms: Vec<Platform> = job
            .url
            .iter()
            .chain(job.mirror_urls.iter())
            .filter(|u| !u.trim().is_empty())
            .map(|u| Platform::detect(u))
            .collect();
        if platforms.is_empty() {
            return;
        }

        if platforms.iter().any(Platform::is_employer_hosted) {
            factors.key(
                FactorCategory::CompanySite,
                "employer_site",
                "Posting is published on an employer or applicant-tracking site".to_string(),
            );
        } else if platforms.iter().all(Platform::is_job_board) {
            factors.risk(
                FactorCategory::CompanySite,
                "job_board_only",
                "Posting only found on job boards, not on an employer site".to_string(),
                self.config.job_board_only_weight,
            );
        }
    }

    fn check_language(&self, job: &JobData, factors: &mut Factors) {
        let description = job.description.as_str();
        let config = &self.config;

        if let Some(found) = PIPELINE_LANGUAGE.find(description) {
            factors.risk(
                FactorCategory::Language,
                "pipeline_language",
                format!("Describes an open-ended talent pipeline (\"{}\")", found.as_str()),
                config.pipeline_language_weight,
            );
        }

        let length = description.trim().chars().count();
        if length < config.min_description_chars {
            factors.risk(
                FactorCategory::Language,
                "short_description",
                format!(
                    "Description has {} characters (under {})",
                    length, config.min_description_chars
                ),
                config.short_description_weight,
            );
        }

        if let Some(found) = COMPENSATION.find(description) {
            factors.key(
                FactorCategory::Language,
                "compensation",
                format!("States compensation (\"{}\")", found.as_str().trim()),
            );
        }
        if let Some(found) = DEADLINE.find(description) {
            factors.key(
                FactorCategory::Language,
                "deadline",
                format!("Gives an application deadline (\"{}\")", found.as_str()),
            );
        }
        if let Some(found) = TIMELINE.find(description) {
            factors.key(
                FactorCategory::Language,
                "timeline",
                format!("Describes a hiring timeline (\"{}\")", found.as_str()),
            );
        }

        let terms = count_technical_terms(description);
        if terms >= config.min_technical_terms {
            factors.key(
                FactorCategory::Language,
                "technical_requirements",
                format!("Names {} specific technical requirements", terms),
            );
        }
    }

    fn check_title(&self, job: &JobData, factors: &mut Factors) {
        if let Some(found) = URGENCY.find(&job.title) {
            factors.risk(
                FactorCategory::Title,
                "urgency_language",
                format!("Title uses urgency language (\"{}\")", found.as_str()),
                self.config.urgency_weight,
            );
        }

        let length = job.title.trim().chars().count();
        if length > self.config.max_title_chars {
            factors.risk(
                FactorCategory::Title,
                "long_title",
                format!(
                    "Title has {} characters (over {})",
                    length, self.config.max_title_chars
                ),
                self.config.long_title_weight,
            );
        }
    }

    fn check_company(&self, job: &JobData, factors: &mut Factors) {
        if let Some(found) = STAFFING.find(&job.company) {
            factors.risk(
                FactorCategory::Company,
                "staffing_agency",
                format!("Company looks like a staffing or consulting firm (\"{}\")", found.as_str()),
                self.config.staffing_weight,
            );
        }

        if is_anonymous_company(&job.company) {
            let rationale = if job.company.trim().is_empty() {
                "Company is not named".to_string()
            } else {
                format!("Company is anonymized or generic (\"{}\")", job.company.trim())
            };
            factors.risk(
                FactorCategory::Company,
                "anonymous_company",
                rationale,
                self.config.anonymous_company_weight,
            );
        }
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn labels(result: &ScoreResult) -> Vec<&str> {
        result.risk_factors.iter().map(|f| f.label.as_str()).collect()
    }

    #[test]
    fn test_urgent_staffing_post_is_high_risk() {
        let job = JobData::new(
            "URGENT: Hiring NOW",
            "ABC Staffing Solutions",
            "Great opportunity, send your resume to us today!!",
        );
        assert!(job.description.chars().count() < 200);

        let result = ScoringEngine::new()
            .score_at(&job, Some(now() - Duration::days(60)), now())
            .unwrap();

        assert_eq!(
            labels(&result),
            vec!["stale_posting", "short_description", "urgency_language", "staffing_agency"]
        );
        assert_eq!(result.ghost_probability, 0.7);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.confidence, 0.85);
        assert!(!result.positive_adjustment_applied);
    }

    #[test]
    fn test_concrete_employer_post_is_low_risk() {
        let description = "Design and operate the backend services behind our payments \
            platform. You will work with Rust, PostgreSQL and Kafka on AWS. Salary range: \
            $150,000 - $180,000 per year plus equity. Apply by July 15; our interview \
            process has three stages and takes about two weeks.";
        let job = JobData::new("Senior Backend Engineer", "Employer Corp", description)
            .with_url("https://careers.employercorp.com/jobs/42");

        let result = ScoringEngine::new()
            .score_at(&job, Some(now() - Duration::days(10)), now())
            .unwrap();

        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.key_factors.len() >= 3);
        assert!(result.positive_adjustment_applied);
        assert_eq!(result.ghost_probability, 0.0);
        let adjustment: f32 = result.key_factors.iter().map(|k| k.weight).sum();
        assert!((adjustment + 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_exception_roles_tolerate_longer_openings() {
        let engine = ScoringEngine::new();
        let job = JobData::new("Assistant Professor of Chemistry", "State University", "x".repeat(300));

        let result = engine.score_at(&job, Some(now() - Duration::days(75)), now()).unwrap();
        assert!(!labels(&result).contains(&"stale_posting"));

        let result = engine.score_at(&job, Some(now() - Duration::days(120)), now()).unwrap();
        assert!(labels(&result).contains(&"stale_posting"));
    }

    #[test]
    fn test_job_board_only_and_pipeline_language() {
        let job = JobData::new(
            "Sales Associate",
            "Confidential",
            format!("We are always accepting applications. {}", "Details follow. ".repeat(20)),
        )
        .with_url("https://www.indeed.com/viewjob?jk=1")
        .with_mirror("https://www.glassdoor.com/job-listing/2");

        let result = ScoringEngine::new().score_at(&job, None, now()).unwrap();
        assert_eq!(
            labels(&result),
            vec!["job_board_only", "pipeline_language", "anonymous_company"]
        );
        assert_eq!(result.ghost_probability, 0.6);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_probability_is_clamped() {
        let job = JobData::new(
            "URGENT!!! Immediate start - hiring now for many roles in every city across the region",
            "Confidential Staffing",
            "Always accepting applications.",
        )
        .with_url("https://www.indeed.com/viewjob?jk=1");

        let result = ScoringEngine::new()
            .score_at(&job, Some(now() - Duration::days(200)), now())
            .unwrap();
        assert!(result.total_risk() > 1.0);
        assert_eq!(result.ghost_probability, 1.0);
    }

    #[test]
    fn test_blank_job_is_rejected() {
        let result = ScoringEngine::new().score_at(&JobData::default(), None, now());
        assert!(matches!(result, Err(ScoringError::InvalidInput(_))));

        let result = ScoringEngine::new().score_json("{\"title\": 42}", None);
        assert!(matches!(result, Err(ScoringError::Json(_))));
    }

    #[test]
    fn test_risk_level_thresholds() {
        let engine = ScoringEngine::new();
        assert_eq!(engine.classify(0.6).0, RiskLevel::High);
        assert_eq!(engine.classify(0.59).0, RiskLevel::Medium);
        assert_eq!(engine.classify(0.35).0, RiskLevel::Medium);
        assert_eq!(engine.classify(0.349), (RiskLevel::Low, 0.80));
    }
}
