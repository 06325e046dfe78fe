//! Extraction strategies for job posting content.
//!
//! Each strategy reads a [`Page`] independently and returns whatever fields it
//! found with per-field confidences. Strategies never fail: malformed input
//! produces empty fields.

pub mod cleanup;
pub mod layout;
pub mod patterns;
pub mod structured;
pub mod text;

pub use layout::{LayoutProfile, LayoutStrategy};
pub use structured::StructuredDataStrategy;
pub use text::TextPatternStrategy;

use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::job::{ContentKind, ExtractedFields, FieldSource, RawSource};
use crate::models::platform::Platform;

use patterns::WHITESPACE;

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Block-level elements that start a new line of visible text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "br", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "section", "article",
    "header", "footer", "ul", "ol", "dt", "dd", "table",
];

/// Parsed view of a raw source shared by all strategies.
pub struct Page {
    /// Parsed source URL, if valid.
    pub url: Option<Url>,
    /// Platform detected from the URL.
    pub platform: Platform,
    /// Content kind.
    pub kind: ContentKind,
    /// Parsed document (HTML sources only).
    pub html: Option<Html>,
    /// Visible text, one block per line.
    pub text: String,
}

impl Page {
    /// Parse a raw source.
    pub fn from_raw(raw: &RawSource) -> Self {
        let url = Url::parse(raw.url.trim()).ok();
        let (html, text) = match raw.kind {
            ContentKind::Html => {
                let html = Html::parse_document(&raw.content);
                let text = visible_text(&html);
                (Some(html), text)
            }
            ContentKind::Text => (None, normalize_lines(&raw.content)),
        };

        debug!(
            "Prepared page for {} ({} chars of visible text)",
            raw.platform,
            text.len()
        );

        Self {
            url,
            platform: raw.platform,
            kind: raw.kind,
            html,
            text,
        }
    }

    /// Text of the first element matching any selector, whitespace collapsed.
    pub fn select_text(&self, selectors: &[&str]) -> Option<String> {
        self.select_first(selectors)
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .filter(|t| !t.is_empty())
    }

    /// Text of the first element matching any selector, keeping block structure.
    pub fn select_block(&self, selectors: &[&str]) -> Option<String> {
        self.select_first(selectors)
            .map(element_text)
            .filter(|t| !t.is_empty())
    }

    /// Content of a `<meta property=...>` or `<meta name=...>` tag.
    pub fn meta(&self, key: &str) -> Option<String> {
        let html = self.html.as_ref()?;
        for attr in ["property", "name"] {
            let selector = Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, key)).ok()?;
            if let Some(content) = html
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .map(collapse_whitespace)
                .find(|c| !c.is_empty())
            {
                return Some(content);
            }
        }
        None
    }

    /// Text of the document `<title>`.
    pub fn document_title(&self) -> Option<String> {
        let html = self.html.as_ref()?;
        let selector = Selector::parse("title").ok()?;
        html.select(&selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    fn select_first(&self, selectors: &[&str]) -> Option<ElementRef<'_>> {
        let html = self.html.as_ref()?;
        selectors.iter().find_map(|s| {
            let selector = Selector::parse(s).ok()?;
            html.select(&selector)
                .find(|el| el.text().any(|t| !t.trim().is_empty()))
        })
    }
}

/// Trait for extraction strategies.
pub trait ExtractionStrategy {
    /// Strategy identifier used in logs.
    fn name(&self) -> &'static str;

    /// Provenance tag of the fields this strategy produces.
    fn source(&self) -> FieldSource;

    /// Extract fields from a prepared page.
    fn extract(&self, page: &Page) -> ExtractedFields;

    /// Extract fields directly from a raw source.
    fn attempt(&self, raw: &RawSource) -> ExtractedFields {
        self.extract(&Page::from_raw(raw))
    }
}

/// Run strategies in priority order, merging with the overwrite margin.
pub fn run_strategies(
    page: &Page,
    strategies: &[&dyn ExtractionStrategy],
    margin: f32,
) -> ExtractedFields {
    let mut merged = ExtractedFields::default();

    for strategy in strategies {
        let found = strategy.extract(page);
        if found.is_empty() && found.posted_at.is_none() {
            debug!("Strategy {} found nothing", strategy.name());
            continue;
        }

        let taken = merged.merge_from(&found, margin);
        debug!(
            "Strategy {} supplied {:?}",
            strategy.name(),
            taken.iter().map(|f| f.as_str()).collect::<Vec<_>>()
        );
    }

    merged
}

/// Collapse all whitespace runs into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Trim every line, collapse inner whitespace and drop blank lines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a URL slug into title-cased words.
pub fn title_case_slug(slug: &str) -> String {
    slug.split(['-', '_', '+', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a posting date written as RFC 3339 or a bare `YYYY-MM-DD`.
pub fn parse_posted_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let day = value.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Truncate to at most `max` characters (0 = unlimited).
pub fn truncate_chars(text: &str, max: usize) -> String {
    if max == 0 || text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

fn visible_text(html: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|s| html.select(&s).next())
        .unwrap_or_else(|| html.root_element());
    element_text(body)
}

fn element_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();

    for node in root.descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                out.push('\n');
            }
            continue;
        }

        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }

    normalize_lines(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_visible_text_skips_scripts() {
        let raw = RawSource::new(
            "https://example.com/jobs/1",
            "<html><head><title>T</title></head><body><h1>Engineer</h1>\
             <script>var x = 1;</script><p>Build <b>things</b>.</p></body></html>",
        );
        let page = Page::from_raw(&raw);
        assert_eq!(page.text, "Engineer\nBuild things .");
    }

    #[test]
    fn test_title_case_slug() {
        assert_eq!(title_case_slug("senior-data-engineer"), "Senior Data Engineer");
        assert_eq!(title_case_slug("acme_CORP"), "Acme Corp");
    }

    #[test]
    fn test_parse_posted_date() {
        let date = parse_posted_date("2024-01-15").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-15T00:00:00+00:00");
        assert!(parse_posted_date("2024-01-15T10:00:00Z").is_some());
        assert!(parse_posted_date("yesterday").is_none());
    }

    #[test]
    fn test_meta_lookup() {
        let raw = RawSource::new(
            "https://example.com",
            r#"<html><head><meta property="og:title" content="Engineer at Acme"></head></html>"#,
        );
        let page = Page::from_raw(&raw);
        assert_eq!(page.meta("og:title").as_deref(), Some("Engineer at Acme"));
        assert_eq!(page.meta("og:site_name"), None);
    }
}
