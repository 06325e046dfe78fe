//! Parser registry: dispatch, learned refinement, validation and fallback.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::ExtractionError;
use crate::learning::CorrectionLearningService;
use crate::models::config::ExtractionConfig;
use crate::models::job::{NormalizedJobRecord, RawSource};
use crate::models::platform::Platform;
use crate::parsers::{
    AtsParser, CompanyCareersParser, GenericParser, JobBoardParser, LinkedInParser, SourceParser,
};

/// Priority-ordered parsers with an always-accepting fallback.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn SourceParser>>,
    fallback: Box<dyn SourceParser>,
    learning: Option<Arc<CorrectionLearningService>>,
    config: ExtractionConfig,
}

impl ParserRegistry {
    /// Registry holding only the generic fallback.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            fallback: Box::new(GenericParser),
            learning: None,
            config: ExtractionConfig::default(),
        }
    }

    /// Registry with every built-in platform parser.
    pub fn with_defaults() -> Self {
        Self::new()
            .register(Box::new(LinkedInParser))
            .register(Box::new(AtsParser))
            .register(Box::new(JobBoardParser))
            .register(Box::new(CompanyCareersParser))
    }

    /// Append a parser; earlier registrations win.
    pub fn register(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Replace the fallback parser.
    pub fn with_fallback(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.fallback = parser;
        self
    }

    /// Refine records with learned corrections.
    pub fn with_learning(mut self, learning: Arc<CorrectionLearningService>) -> Self {
        self.learning = Some(learning);
        self
    }

    /// Set quality thresholds.
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    /// Registered parser names, fallback last.
    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers
            .iter()
            .map(|p| p.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// First registered parser accepting the URL, else the fallback.
    pub fn select_parser(&self, url: &Url) -> &dyn SourceParser {
        self.parsers
            .iter()
            .find(|p| p.can_handle(url))
            .map(|p| p.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Parse a source with the best parser for its URL.
    ///
    /// Records that miss the quality thresholds are re-parsed with the
    /// fallback; if both miss, the better one is returned flagged
    /// `low_confidence` with the failed thresholds listed.
    pub fn parse_job(
        &self,
        url: &str,
        raw: &RawSource,
    ) -> Result<NormalizedJobRecord, ExtractionError> {
        let source = if raw.url == url {
            raw.clone()
        } else {
            let mut source = raw.clone();
            source.url = url.to_string();
            source.platform = Platform::detect(url);
            source
        };

        let parser = match Url::parse(url.trim()) {
            Ok(parsed) => {
                let parser = self.select_parser(&parsed);
                if !parser.can_handle(&parsed) {
                    return Err(ExtractionError::UnsupportedSource {
                        url: url.to_string(),
                    });
                }
                parser
            }
            Err(_) => {
                debug!("Unparseable URL '{}', using {}", url, self.fallback.name());
                self.fallback.as_ref()
            }
        };

        info!("Parsing {} with {}", url, parser.name());
        let mut record = self.run(parser, url, &source);
        let mut issues = self.validate(&record);

        if !issues.is_empty() && parser.name() != self.fallback.name() {
            warn!(
                "{} result failed validation ({}); retrying with {}",
                parser.name(),
                issues.join(", "),
                self.fallback.name()
            );
            let fallback = self.run(self.fallback.as_ref(), url, &source);
            if fallback.confidence > record.confidence {
                record = fallback;
                record.metadata.fallback_used = true;
                issues = self.validate(&record);
            }
        }

        if !issues.is_empty() {
            warn!(
                "Low-confidence extraction for {} ({:.2}): {}",
                url,
                record.confidence,
                issues.join(", ")
            );
            record.metadata.low_confidence = true;
            record.metadata.quality_issues = issues;
        }

        Ok(record)
    }

    /// Quality thresholds the record misses; empty when it passes.
    pub fn validate(&self, record: &NormalizedJobRecord) -> Vec<String> {
        let config = &self.config;
        let mut issues = Vec::new();

        if record.confidence < config.min_overall_confidence {
            issues.push(format!(
                "overall confidence {:.2} below {:.2}",
                record.confidence, config.min_overall_confidence
            ));
        }
        if record.fields.title.confidence < config.min_title_confidence {
            issues.push(format!(
                "title confidence {:.2} below {:.2}",
                record.fields.title.confidence, config.min_title_confidence
            ));
        }
        if record.fields.company.confidence < config.min_company_confidence {
            issues.push(format!(
                "company confidence {:.2} below {:.2}",
                record.fields.company.confidence, config.min_company_confidence
            ));
        }
        if !record.fields.title.is_present()
            || record.title().chars().count() < config.min_title_length
        {
            issues.push(format!("title shorter than {} chars", config.min_title_length));
        }
        if !record.fields.company.is_present()
            || record.company().chars().count() < config.min_company_length
        {
            issues.push(format!("company shorter than {} chars", config.min_company_length));
        }

        issues
    }

    fn run(&self, parser: &dyn SourceParser, url: &str, source: &RawSource) -> NormalizedJobRecord {
        let record = parser.parse_with(source, &self.config);
        let Some(learning) = self.learning.as_ref() else {
            return record;
        };

        match learning.apply_learned_patterns(&record, url, parser.name()) {
            Ok((refined, applied)) => {
                if !applied.is_empty() {
                    debug!("{} corrections applied to {}", applied.len(), record.id);
                }
                refined
            }
            Err(e) => {
                warn!("Correction lookup failed for {}: {}", url, e);
                record
            }
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::correction::{Correction, CorrectionPattern};
    use crate::models::job::{FieldSource, JobField, UNKNOWN_COMPANY};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn raw(url: &str, content: &str) -> RawSource {
        RawSource::new(url, content)
            .with_fetched_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_select_parser() {
        let registry = ParserRegistry::with_defaults();
        let cases = [
            ("https://www.linkedin.com/jobs/view/1", "linkedin"),
            ("https://boards.greenhouse.io/acme/jobs/1", "ats"),
            ("https://www.indeed.com/viewjob?jk=1", "job_board"),
            ("https://careers.acme.com/jobs/1", "company_careers"),
            ("https://blog.example.org/post", "generic"),
        ];
        for (u, expected) in cases {
            assert_eq!(registry.select_parser(&url(u)).name(), expected, "{}", u);
        }
        assert_eq!(ParserRegistry::new().select_parser(&url(cases[0].0)).name(), "generic");
    }

    #[test]
    fn test_well_formed_posting_passes_validation() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Data Engineer",
             "hiringOrganization":{"name":"Acme"},
             "jobLocation":{"address":{"addressLocality":"Austin"}},
             "description":"Build pipelines in Rust and Python for our analytics team."}
            </script></head><body></body></html>"#;
        let record = ParserRegistry::with_defaults()
            .parse_job("https://careers.acme.com/jobs/1", &raw("https://careers.acme.com/jobs/1", html))
            .unwrap();

        assert!(!record.metadata.low_confidence);
        assert!(record.metadata.quality_issues.is_empty());
        assert_eq!(record.metadata.parser_name, "company_careers");
    }

    #[test]
    fn test_poor_parse_is_flagged_not_raised() {
        let source = raw("https://example.com/jobs/1", "<html><body><p>Hi</p></body></html>");
        let record = ParserRegistry::with_defaults()
            .parse_job("https://example.com/jobs/1", &source)
            .unwrap();

        assert_eq!(record.company(), UNKNOWN_COMPANY);
        assert!(record.metadata.low_confidence);
        assert!(!record.metadata.quality_issues.is_empty());
    }

    #[test]
    fn test_equal_fallback_result_is_not_preferred() {
        // Both parsers read the same generic markup.
        let html = r#"<html><body><h1 class="job-title">Data Engineer</h1>
            <div class="company-name">Acme</div></body></html>"#;
        let source = raw("https://www.linkedin.com/jobs/view/3812345678", html);
        let registry = ParserRegistry::new().register(Box::new(LinkedInParser));
        let record = registry
            .parse_job("https://www.linkedin.com/jobs/view/3812345678", &source)
            .unwrap();

        assert_eq!(record.title(), "Data Engineer");
        assert_eq!(record.metadata.parser_name, "linkedin");
        assert!(record.metadata.low_confidence);
        assert!(!record.metadata.fallback_used);
    }

    struct TitleBlindParser;

    impl SourceParser for TitleBlindParser {
        fn name(&self) -> &'static str {
            "title_blind"
        }

        fn can_handle(&self, _url: &Url) -> bool {
            true
        }

        fn post_process(
            &self,
            fields: &mut crate::models::job::ExtractedFields,
            _page: &crate::extraction::Page,
        ) {
            fields.title = crate::models::job::ExtractionField::absent();
        }
    }

    #[test]
    fn test_better_fallback_result_wins() {
        let html = r#"<html><body><h1>Data Engineer</h1>
            <div class="company">Acme</div></body></html>"#;
        let source = raw("https://example.org/openings/7", html);
        let registry = ParserRegistry::new().register(Box::new(TitleBlindParser));
        let record = registry.parse_job("https://example.org/openings/7", &source).unwrap();

        assert_eq!(record.title(), "Data Engineer");
        assert_eq!(record.metadata.parser_name, "generic");
        assert!(record.metadata.fallback_used);
    }

    #[test]
    fn test_url_argument_overrides_source_url() {
        let source = raw("", "Job Title: Data Engineer\nCompany: Acme");
        let record = ParserRegistry::with_defaults()
            .parse_job("https://www.indeed.com/viewjob?jk=9", &source)
            .unwrap();

        assert_eq!(record.source_url, "https://www.indeed.com/viewjob?jk=9");
        assert_eq!(record.platform, Platform::Indeed);
        assert_eq!(record.metadata.parser_name, "job_board");
    }

    #[test]
    fn test_invalid_url_uses_fallback() {
        let source = raw("not a url", "Job Title: Data Engineer\nCompany: Acme");
        let record = ParserRegistry::with_defaults()
            .parse_job("not a url", &source)
            .unwrap();
        assert_eq!(record.metadata.parser_name, "generic");
        assert!(!record.metadata.warnings.is_empty());
    }

    #[test]
    fn test_learned_correction_is_applied() {
        let learning = Arc::new(CorrectionLearningService::in_memory());
        learning
            .record_correction(
                Correction::new(
                    CorrectionPattern::Domain("example.com".to_string()),
                    JobField::Company,
                    Some(UNKNOWN_COMPANY.to_string()),
                    "Acme Inc",
                    0.9,
                )
                .verified(),
            )
            .unwrap();

        let registry = ParserRegistry::with_defaults().with_learning(learning);
        let source = raw("https://example.com/jobs/1", "<html><body></body></html>");
        let record = registry.parse_job("https://example.com/jobs/1", &source).unwrap();

        assert_eq!(record.company(), "Acme Inc");
        assert_eq!(record.fields.company.source, FieldSource::Correction);
        assert_eq!(record.fields.company.confidence, 0.9);
        assert_eq!(record.metadata.applied_improvements.len(), 1);
    }

    #[test]
    fn test_parse_job_is_idempotent() {
        let registry = ParserRegistry::with_defaults();
        let source = raw(
            "https://careers.acme.com/jobs/1",
            "<html><body><h1>Data Engineer</h1></body></html>",
        );
        let first = registry.parse_job("https://careers.acme.com/jobs/1", &source).unwrap();
        let second = registry.parse_job("https://careers.acme.com/jobs/1", &source).unwrap();
        assert_eq!(first, second);
    }
}
