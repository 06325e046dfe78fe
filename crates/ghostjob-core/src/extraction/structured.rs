//! Embedded schema.org `JobPosting` extraction.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{ExtractionStrategy, Page, collapse_whitespace, parse_posted_date};
use crate::models::job::{ExtractedFields, ExtractionField, FieldSource};

const TITLE_CONFIDENCE: f32 = 0.90;
const COMPANY_CONFIDENCE: f32 = 0.90;
const LOCATION_CONFIDENCE: f32 = 0.85;
const DESCRIPTION_CONFIDENCE: f32 = 0.85;

/// Reads `<script type="application/ld+json">` job posting records.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredDataStrategy;

impl ExtractionStrategy for StructuredDataStrategy {
    fn name(&self) -> &'static str {
        "structured_data"
    }

    fn source(&self) -> FieldSource {
        FieldSource::StructuredData
    }

    fn extract(&self, page: &Page) -> ExtractedFields {
        let Some(html) = page.html.as_ref() else {
            return ExtractedFields::default();
        };

        find_job_postings(html)
            .first()
            .map(fields_from_posting)
            .unwrap_or_default()
    }
}

/// All JSON-LD objects typed `JobPosting` in the document.
pub fn find_job_postings(html: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut postings = Vec::new();
    for script in html.select(&selector) {
        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(json) => postings.extend(
                flatten_jsonld(&json)
                    .into_iter()
                    .filter(is_job_posting),
            ),
            Err(e) => debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    postings
}

/// Flatten JSON-LD into individual items (handles `@graph` and arrays).
fn flatten_jsonld(json: &Value) -> Vec<Value> {
    match json {
        Value::Array(items) => items.iter().flat_map(flatten_jsonld).collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(graph) => flatten_jsonld(graph),
            None => vec![json.clone()],
        },
        _ => Vec::new(),
    }
}

fn is_job_posting(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("JobPosting"),
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str().is_some_and(|t| t.eq_ignore_ascii_case("JobPosting"))),
        _ => false,
    }
}

fn fields_from_posting(posting: &Value) -> ExtractedFields {
    let title = text_of(posting.get("title")).or_else(|| text_of(posting.get("name")));
    let company = posting.get("hiringOrganization").and_then(|org| match org {
        Value::Object(_) => text_of(org.get("name")),
        other => text_of(Some(other)),
    });
    let description = text_of(posting.get("description")).map(|d| strip_markup(&d));

    ExtractedFields {
        title: field(title, TITLE_CONFIDENCE),
        company: field(company, COMPANY_CONFIDENCE),
        location: field(location_of(posting), LOCATION_CONFIDENCE),
        description: field(description, DESCRIPTION_CONFIDENCE),
        posted_at: text_of(posting.get("datePosted")).and_then(|d| parse_posted_date(&d)),
    }
}

fn field(value: Option<String>, confidence: f32) -> ExtractionField {
    value
        .map(|v| ExtractionField::new(v, confidence, FieldSource::StructuredData))
        .unwrap_or_default()
}

fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(collapse_whitespace(s)).filter(|s| !s.is_empty()),
        Value::Array(items) => items.iter().find_map(|v| text_of(Some(v))),
        _ => None,
    }
}

fn location_of(posting: &Value) -> Option<String> {
    let remote = posting
        .get("jobLocationType")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE"));

    let places: Vec<&Value> = match posting.get("jobLocation") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(place) => vec![place],
        None => Vec::new(),
    };

    let location = places.into_iter().find_map(|place| {
        let address = place.get("address").unwrap_or(place);
        if let Value::String(s) = address {
            return Some(collapse_whitespace(s)).filter(|s| !s.is_empty());
        }

        let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
            .iter()
            .filter_map(|key| {
                let part = address.get(*key)?;
                match part {
                    Value::Object(_) => text_of(part.get("name")),
                    _ => text_of(Some(part)),
                }
            })
            .collect();

        (!parts.is_empty()).then(|| parts.join(", "))
    });

    match (location, remote) {
        (Some(location), true) => Some(format!("Remote ({})", location)),
        (None, true) => Some("Remote".to_string()),
        (location, false) => location,
    }
}

fn strip_markup(description: &str) -> String {
    if !description.contains('<') {
        return description.to_string();
    }
    let fragment = Html::parse_fragment(description);
    collapse_whitespace(&fragment.root_element().text().collect::<Vec<_>>().join(" "))
}
