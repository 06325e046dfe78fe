//! Source parsers, one per platform family.
//!
//! A parser declares which URLs it accepts and runs the extraction strategies
//! in a fixed priority order: structured data, layout, then text patterns.
//! Shared post-processing (cleanup, URL-derived fallback, placeholders) lives
//! in [`SourceParser::parse_with`]; parsers customize it through
//! [`SourceParser::layout_profile`] and [`SourceParser::post_process`].

mod ats;
mod company;
mod generic;
mod job_board;
mod linkedin;

pub use ats::AtsParser;
pub use company::CompanyCareersParser;
pub use generic::GenericParser;
pub use job_board::JobBoardParser;
pub use linkedin::LinkedInParser;

use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::dedup::canonical::{canonicalize_url, exact_url_key};
use crate::extraction::cleanup::{
    clean_company, clean_title, company_from_host, is_valid_title, title_from_path,
};
use crate::extraction::{
    LayoutProfile, LayoutStrategy, Page, StructuredDataStrategy, TextPatternStrategy,
    run_strategies, truncate_chars,
};
use crate::models::config::ExtractionConfig;
use crate::models::job::{
    ExtractedFields, ExtractionField, ExtractionMetadata, FieldSource, JobField,
    NormalizedJobRecord, RawSource, UNKNOWN_COMPANY, UNKNOWN_POSITION,
};

/// Default parser version.
pub const PARSER_VERSION: &str = "1.0.0";

/// Trait for platform-specific job parsers.
pub trait SourceParser: Send + Sync {
    /// Parser identity, used to scope learned corrections.
    fn name(&self) -> &'static str;

    /// Parser version.
    fn version(&self) -> &'static str {
        PARSER_VERSION
    }

    /// Whether this parser accepts the URL.
    fn can_handle(&self, url: &Url) -> bool;

    /// Platform selector profile tried before the generic one.
    fn layout_profile(&self, _url: &Url) -> Option<&'static LayoutProfile> {
        None
    }

    /// Parser-specific adjustments after strategies were merged and cleaned.
    fn post_process(&self, _fields: &mut ExtractedFields, _page: &Page) {}

    /// Parse a raw source with default thresholds.
    fn parse(&self, raw: &RawSource) -> NormalizedJobRecord {
        self.parse_with(raw, &ExtractionConfig::default())
    }

    /// Parse a raw source.
    fn parse_with(&self, raw: &RawSource, config: &ExtractionConfig) -> NormalizedJobRecord {
        let page = Page::from_raw(raw);

        let mut layout = LayoutStrategy::new();
        if let Some(profile) = page.url.as_ref().and_then(|u| self.layout_profile(u)) {
            layout = layout.with_profile(profile);
        }

        let mut fields = run_strategies(
            &page,
            &[&StructuredDataStrategy, &layout, &TextPatternStrategy],
            config.overwrite_margin,
        );

        clean_fields(&mut fields, config);
        self.post_process(&mut fields, &page);
        let warnings = apply_url_fallback(&mut fields, &page, config);
        fill_placeholders(&mut fields);

        debug!(
            "{} parsed '{}' at '{}' ({} of 4 fields)",
            self.name(),
            fields.title.as_str().unwrap_or(UNKNOWN_POSITION),
            fields.company.as_str().unwrap_or(UNKNOWN_COMPANY),
            fields.completeness()
        );

        build_record(self, raw, fields, warnings)
    }
}

/// Apply company and title cleanup shared by every parser.
fn clean_fields(fields: &mut ExtractedFields, config: &ExtractionConfig) {
    let raw_company = fields.company.value.clone();
    if let Some(company) = raw_company.as_deref() {
        replace_value(&mut fields.company, clean_company(company));
    }

    if let Some(title) = fields.title.as_str() {
        let mut cleaned = clean_title(title, raw_company.as_deref());
        if fields.company.value != raw_company {
            cleaned = clean_title(&cleaned, fields.company.as_str());
        }
        if is_valid_title(&cleaned) {
            replace_value(&mut fields.title, cleaned);
        } else {
            debug!("Rejecting boilerplate title '{}'", title);
            fields.title = ExtractionField::absent();
        }
    }

    if let Some(description) = fields.description.as_str() {
        let truncated = truncate_chars(description, config.max_description_chars);
        replace_value(&mut fields.description, truncated);
    }
}

/// Replace a field's value keeping confidence and provenance; blank values
/// clear the field.
pub(crate) fn replace_value(field: &mut ExtractionField, value: String) {
    *field = ExtractionField::new(value, field.confidence, field.source);
}

/// Guess missing title/company from the URL, capped below markup confidence.
fn apply_url_fallback(
    fields: &mut ExtractedFields,
    page: &Page,
    config: &ExtractionConfig,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(url) = page.url.as_ref() else {
        return warnings;
    };
    let cap = config.url_fallback_confidence_cap;

    if fields.company.value.is_none() {
        if let Some(company) = company_from_host(url) {
            warnings.push(format!("company guessed from host: {}", company));
            fields.company = ExtractionField::new(company, cap, FieldSource::UrlDerived);
        }
    }

    if fields.title.value.is_none() {
        if let Some(title) = title_from_path(url) {
            warnings.push(format!("title guessed from path: {}", title));
            fields.title = ExtractionField::new(title, cap * 0.9, FieldSource::UrlDerived);
        }
    }

    warnings
}

/// Make missing title/company explicit.
fn fill_placeholders(fields: &mut ExtractedFields) {
    if fields.title.value.is_none() {
        fields.title = ExtractionField::placeholder(UNKNOWN_POSITION);
    }
    if fields.company.value.is_none() {
        fields.company = ExtractionField::placeholder(UNKNOWN_COMPANY);
    }
}

/// Stable record id derived from the exact source URL (or the content for
/// URL-less documents).
pub fn record_id(url: &str, content: &str) -> Uuid {
    match exact_url_key(url) {
        Ok(key) => Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()),
        Err(_) => Uuid::new_v5(&Uuid::NAMESPACE_OID, content.as_bytes()),
    }
}

fn build_record<P: SourceParser + ?Sized>(
    parser: &P,
    raw: &RawSource,
    fields: ExtractedFields,
    mut warnings: Vec<String>,
) -> NormalizedJobRecord {
    let canonical_url = canonicalize_url(&raw.url).unwrap_or_else(|_| raw.url.trim().to_string());
    if !raw.url.trim().is_empty() && Url::parse(raw.url.trim()).is_err() {
        warnings.push(format!("source URL is not valid: {}", raw.url));
    }

    let strategy = JobField::ALL
        .iter()
        .map(|f| fields.get(*f))
        .find(|f| f.is_present())
        .map(|f| f.source)
        .unwrap_or(FieldSource::Placeholder);

    let mut record = NormalizedJobRecord {
        id: record_id(&raw.url, &raw.content),
        version: 1,
        fields,
        confidence: 0.0,
        source_url: raw.url.clone(),
        canonical_url,
        platform: raw.platform,
        metadata: ExtractionMetadata {
            parser_name: parser.name().to_string(),
            parser_version: parser.version().to_string(),
            strategy,
            extracted_at: raw.fetched_at,
            fallback_used: false,
            low_confidence: false,
            quality_issues: Vec::new(),
            applied_improvements: Vec::new(),
            warnings,
        },
    };
    record.recompute_confidence();
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn fixed(raw: RawSource) -> RawSource {
        raw.with_fetched_at(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_empty_page_yields_placeholders() {
        let raw = fixed(RawSource::new("https://example.com/jobs/1", "<html><body></body></html>"));
        let record = GenericParser.parse(&raw);

        assert_eq!(record.title(), UNKNOWN_POSITION);
        assert_eq!(record.company(), UNKNOWN_COMPANY);
        assert_eq!(record.fields.company.confidence, 0.0);
        assert_eq!(record.fields.company.source, FieldSource::Placeholder);
        assert_eq!(record.confidence, 0.0);
        assert_eq!(record.metadata.strategy, FieldSource::Placeholder);
    }

    #[test]
    fn test_structured_data_wins_over_layout() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Staff Engineer",
             "hiringOrganization":{"name":"Globex Corporation"}}
            </script></head><body><h1>Careers</h1></body></html>"#;
        let raw = fixed(RawSource::new("https://globex.com/careers/staff-engineer", html));
        let record = GenericParser.parse(&raw);

        assert_eq!(record.title(), "Staff Engineer");
        assert_eq!(record.company(), "Globex");
        assert_eq!(record.fields.title.source, FieldSource::StructuredData);
        assert_eq!(record.metadata.strategy, FieldSource::StructuredData);
    }

    #[test]
    fn test_ranked_list_company_keeps_its_number() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Operations Manager",
             "hiringOrganization":{"name":"Fortune 500"}}
            </script></head><body></body></html>"#;
        let raw = fixed(RawSource::new("https://example.com/jobs/7", html));
        let record = GenericParser.parse(&raw);

        assert_eq!(record.company(), "Fortune 500");
        assert!(crate::scoring::lexicon::is_anonymous_company(record.company()));
    }

    #[test]
    fn test_url_fallback_is_capped() {
        let raw = fixed(RawSource::new(
            "https://careers.initech.com/openings/tps-report-analyst",
            "<html><body><p>Apply</p></body></html>",
        ));
        let record = CompanyCareersParser.parse(&raw);

        assert_eq!(record.company(), "Initech");
        assert_eq!(record.fields.company.source, FieldSource::UrlDerived);
        assert!(record.fields.company.confidence <= 0.4);
        assert_eq!(record.title(), "Tps Report Analyst");
        assert!(record.fields.title.confidence < record.fields.company.confidence);
        assert_eq!(record.metadata.warnings.len(), 2);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let raw = fixed(RawSource::new(
            "https://example.com/jobs/1",
            "<html><body><h1>Analyst</h1><div class=\"company\">Acme</div></body></html>",
        ));
        assert_eq!(GenericParser.parse(&raw), GenericParser.parse(&raw));
    }

    #[test]
    fn test_record_id_ignores_fragment() {
        assert_eq!(
            record_id("https://example.com/jobs/1#apply", ""),
            record_id("https://EXAMPLE.com/jobs/1/", "")
        );
        assert_ne!(record_id("", "a"), record_id("", "b"));
    }
}
