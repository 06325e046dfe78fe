//! Free-text heuristics: labelled lines, hiring phrases and URL slugs.

use url::Url;

use super::patterns::{
    COMPANY_LABEL, IS_HIRING, JOIN_AS, LINKEDIN_SLUG, LOCATION_LABEL, POSTED_DATE, TITLE_LABEL,
    WORKDAY_JOB,
};
use super::{ExtractionStrategy, Page, parse_posted_date, title_case_slug};
use crate::models::job::{ExtractedFields, ExtractionField, FieldSource};

const LABEL_CONFIDENCE: f32 = 0.55;
const PHRASE_CONFIDENCE: f32 = 0.50;
const SLUG_CONFIDENCE: f32 = 0.50;
const SUBDOMAIN_SLUG_CONFIDENCE: f32 = 0.45;
const DESCRIPTION_CONFIDENCE: f32 = 0.35;

/// Minimum visible text length worth reporting as a description.
const MIN_DESCRIPTION_CHARS: usize = 40;

/// Path segments that are part of an ATS route, not a company slug.
const ROUTE_SEGMENTS: &[&str] = &["embed", "jobs", "job", "v1", "api", "o", "en-us"];

/// Regular-expression scanning of visible text and the URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPatternStrategy;

impl ExtractionStrategy for TextPatternStrategy {
    fn name(&self) -> &'static str {
        "text_pattern"
    }

    fn source(&self) -> FieldSource {
        FieldSource::TextPattern
    }

    fn extract(&self, page: &Page) -> ExtractedFields {
        let text = page.text.as_str();
        let mut fields = ExtractedFields::default();

        fill(&mut fields.title, first_capture(&TITLE_LABEL, text), LABEL_CONFIDENCE);
        fill(&mut fields.company, first_capture(&COMPANY_LABEL, text), LABEL_CONFIDENCE);
        fill(&mut fields.location, first_capture(&LOCATION_LABEL, text), LABEL_CONFIDENCE);

        if let Some(caps) = IS_HIRING.captures(text).or_else(|| JOIN_AS.captures(text)) {
            fill(&mut fields.company, Some(caps[1].to_string()), PHRASE_CONFIDENCE);
            fill(&mut fields.title, Some(caps[2].to_string()), PHRASE_CONFIDENCE);
        }

        if let Some(url) = page.url.as_ref() {
            let slug = decompose_url(url);
            if fields.title.value.is_none() {
                fields.title = slug.title;
            }
            if fields.company.value.is_none() {
                fields.company = slug.company;
            }
        }

        if text.chars().count() >= MIN_DESCRIPTION_CHARS {
            fields.description =
                ExtractionField::new(text, DESCRIPTION_CONFIDENCE, FieldSource::TextPattern);
        }

        fields.posted_at = POSTED_DATE
            .captures(text)
            .and_then(|caps| parse_posted_date(&caps[1]));

        fields
    }
}

/// Decode title and company from platform-specific URL shapes.
pub fn decompose_url(url: &Url) -> ExtractedFields {
    let mut fields = ExtractedFields::default();
    let host = url.host_str().unwrap_or("").to_lowercase();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if host.contains("linkedin.") {
        if let Some(caps) = LINKEDIN_SLUG.captures(url.path()) {
            fields.title = slug_field(&caps["title"], SLUG_CONFIDENCE);
            fields.company = slug_field(&caps["company"], SLUG_CONFIDENCE);
        }
    } else if host.ends_with("lever.co")
        || host.ends_with("greenhouse.io")
        || host.ends_with("ashbyhq.com")
    {
        // jobs.lever.co/<company>/<id>, boards.greenhouse.io/<company>/jobs/<id>
        if let Some(company) = segments
            .iter()
            .find(|seg| !ROUTE_SEGMENTS.contains(&seg.to_lowercase().as_str()))
        {
            fields.company = slug_field(company, SLUG_CONFIDENCE);
        }
    } else if host.ends_with("myworkdayjobs.com") {
        // <company>.wd5.myworkdayjobs.com/<site>/job/<location>/<Title>_<req>
        if let Some(label) = host.split('.').next() {
            fields.company = slug_field(label, SUBDOMAIN_SLUG_CONFIDENCE);
        }
        if let Some(caps) = WORKDAY_JOB.captures(url.path()) {
            fields.title = slug_field(&caps["title"], SUBDOMAIN_SLUG_CONFIDENCE);
        }
    } else if host.ends_with("smartrecruiters.com") {
        // jobs.smartrecruiters.com/<Company>/<id>-<title-slug>
        if let Some(company) = segments.first() {
            fields.company = slug_field(company, SUBDOMAIN_SLUG_CONFIDENCE);
        }
        if let Some(rest) = segments.get(1) {
            let title = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == '-');
            fields.title = slug_field(title, SUBDOMAIN_SLUG_CONFIDENCE);
        }
    }

    fields
}

fn slug_field(slug: &str, confidence: f32) -> ExtractionField {
    let decoded = decode_segment(slug);
    ExtractionField::new(title_case_slug(&decoded), confidence, FieldSource::TextPattern)
}

/// Percent-decode a path segment.
fn decode_segment(segment: &str) -> String {
    url::form_urlencoded::parse(format!("s={}", segment).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn first_capture(pattern: &regex::Regex, text: &str) -> Option<String> {
    pattern.captures(text).map(|caps| caps[1].trim().to_string())
}

fn fill(field: &mut ExtractionField, value: Option<String>, confidence: f32) {
    if field.value.is_some() {
        return;
    }
    if let Some(value) = value {
        *field = ExtractionField::new(value, confidence, FieldSource::TextPattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::RawSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labelled_text_document() {
        let text = "Job Title: Backend Engineer\nCompany: Acme Robotics\nLocation: Remote\n\
                    We are looking for an engineer to build our platform.\nPosted: 2024-02-01";
        let raw = RawSource::new("", text);
        let fields = TextPatternStrategy.attempt(&raw);

        assert_eq!(fields.title.as_str(), Some("Backend Engineer"));
        assert_eq!(fields.title.confidence, 0.55);
        assert_eq!(fields.company.as_str(), Some("Acme Robotics"));
        assert_eq!(fields.location.as_str(), Some("Remote"));
        assert_eq!(fields.description.confidence, 0.35);
        assert!(fields.posted_at.is_some());
    }

    #[test]
    fn test_hiring_phrase() {
        let raw = RawSource::new("", "Globex is hiring a Site Reliability Engineer!");
        let fields = TextPatternStrategy.attempt(&raw);
        assert_eq!(fields.company.as_str(), Some("Globex"));
        assert_eq!(fields.title.as_str(), Some("Site Reliability Engineer"));
    }

    #[test]
    fn test_linkedin_slug_decomposition() {
        let url = Url::parse(
            "https://www.linkedin.com/jobs/view/senior-data-engineer-at-acme-corp-3812345678?trk=x",
        )
        .unwrap();
        let fields = decompose_url(&url);
        assert_eq!(fields.title.as_str(), Some("Senior Data Engineer"));
        assert_eq!(fields.company.as_str(), Some("Acme Corp"));
        assert_eq!(fields.company.source, FieldSource::TextPattern);
    }

    #[test]
    fn test_ats_slugs() {
        let lever = Url::parse("https://jobs.lever.co/initech/4f1c-uuid").unwrap();
        assert_eq!(decompose_url(&lever).company.as_str(), Some("Initech"));

        let greenhouse = Url::parse("https://boards.greenhouse.io/globex/jobs/42").unwrap();
        assert_eq!(decompose_url(&greenhouse).company.as_str(), Some("Globex"));

        let workday = Url::parse(
            "https://umbrella.wd5.myworkdayjobs.com/External/job/Berlin/Lab-Technician_R123",
        )
        .unwrap();
        let fields = decompose_url(&workday);
        assert_eq!(fields.company.as_str(), Some("Umbrella"));
        assert_eq!(fields.title.as_str(), Some("Lab Technician"));
        assert_eq!(fields.title.confidence, 0.45);
    }

    #[test]
    fn test_short_text_has_no_description() {
        let raw = RawSource::new("", "hello");
        assert!(TextPatternStrategy.attempt(&raw).description.value.is_none());
    }
}
