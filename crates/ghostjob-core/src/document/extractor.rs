//! Document text extraction using lopdf and pdf-extract.

use chrono::{DateTime, Utc};
use lopdf::Document;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::Result;
use crate::error::DocumentError;
use crate::models::job::{ContentKind, RawSource};

/// Minimum non-whitespace characters for a PDF to count as text-bearing.
const MIN_TEXT_CHARS: usize = 20;

/// Detected format of uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Html,
    Text,
}

impl DocumentFormat {
    /// Sniff the format from leading bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"%PDF") {
            return Some(DocumentFormat::Pdf);
        }
        let text = std::str::from_utf8(strip_bom(data)).ok()?;
        match ContentKind::detect(text) {
            ContentKind::Html => Some(DocumentFormat::Html),
            ContentKind::Text => Some(DocumentFormat::Text),
        }
    }
}

/// Converts uploaded documents into raw sources.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    min_text_chars: usize,
    fetched_at: Option<DateTime<Utc>>,
}

impl DocumentExtractor {
    /// Create a new document extractor.
    pub fn new() -> Self {
        Self {
            min_text_chars: MIN_TEXT_CHARS,
            fetched_at: None,
        }
    }

    /// Pin the timestamp recorded on produced sources.
    pub fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    /// Extract a raw source from document bytes.
    ///
    /// Without an explicit URL, HTML documents are searched for a canonical
    /// link or `og:url`; other documents get an empty URL.
    pub fn extract(&self, data: &[u8], url: Option<&str>) -> Result<RawSource> {
        let format = DocumentFormat::detect(data).ok_or(DocumentError::UnsupportedFormat)?;

        let (content, kind) = match format {
            DocumentFormat::Pdf => (self.pdf_text(data)?, ContentKind::Text),
            DocumentFormat::Html | DocumentFormat::Text => {
                let text = std::str::from_utf8(strip_bom(data))
                    .map_err(|_| DocumentError::UnsupportedFormat)?;
                let kind = if format == DocumentFormat::Html {
                    ContentKind::Html
                } else {
                    ContentKind::Text
                };
                (text.to_string(), kind)
            }
        };

        let url = match url {
            Some(url) => url.trim().to_string(),
            None if kind == ContentKind::Html => discover_source_url(&content).unwrap_or_default(),
            None => String::new(),
        };

        info!(
            "Extracted {:?} document ({} chars){}",
            format,
            content.len(),
            if url.is_empty() { String::new() } else { format!(" for {}", url) }
        );

        let mut raw = RawSource::new(url, content).with_kind(kind);
        if let Some(fetched_at) = self.fetched_at {
            raw = raw.with_fetched_at(fetched_at);
        }
        Ok(raw)
    }

    fn pdf_text(&self, data: &[u8]) -> Result<String> {
        let mut doc = Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| DocumentError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(DocumentError::NoPages);
        }
        debug!("Loaded PDF with {} pages", page_count);

        let text = pdf_extract::extract_text_from_mem(&raw_data)
            .map_err(|e| DocumentError::TextExtraction(e.to_string()))?;

        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        if visible < self.min_text_chars {
            return Err(DocumentError::NoText);
        }
        Ok(text)
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Source URL declared by an HTML page (canonical link, then `og:url`).
pub fn discover_source_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let candidates = [
        ("link[rel=\"canonical\"]", "href"),
        ("meta[property=\"og:url\"]", "content"),
    ];

    candidates.iter().find_map(|(selector, attr)| {
        let selector = Selector::parse(selector).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|href| {
                Url::parse(href).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
            })
            .map(str::to_string)
    })
}

fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, dictionary};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detect_format() {
        assert_eq!(DocumentFormat::detect(b"%PDF-1.7\n"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::detect(b"<html><body>x</body></html>"), Some(DocumentFormat::Html));
        assert_eq!(DocumentFormat::detect(b"Job Title: Engineer"), Some(DocumentFormat::Text));
        assert_eq!(DocumentFormat::detect(&[0xff, 0xfe, 0x00, 0x81]), None);
    }

    #[test]
    fn test_html_discovers_canonical_url() {
        let html = r#"<html><head>
            <link rel="canonical" href="https://boards.greenhouse.io/acme/jobs/123">
            <title>Engineer at Acme</title></head><body></body></html>"#;

        let raw = DocumentExtractor::new().extract(html.as_bytes(), None).unwrap();
        assert_eq!(raw.kind, ContentKind::Html);
        assert_eq!(raw.url, "https://boards.greenhouse.io/acme/jobs/123");

        let raw = DocumentExtractor::new()
            .extract(html.as_bytes(), Some("https://example.com/jobs/9"))
            .unwrap();
        assert_eq!(raw.url, "https://example.com/jobs/9");
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "\u{feff}Job Title: Data Analyst\nCompany: Globex";
        let raw = DocumentExtractor::new().extract(text.as_bytes(), None).unwrap();
        assert_eq!(raw.kind, ContentKind::Text);
        assert_eq!(raw.url, "");
        assert!(raw.content.starts_with("Job Title"));
    }

    #[test]
    fn test_unsupported_and_broken_documents() {
        let result = DocumentExtractor::new().extract(&[0xff, 0xfe, 0x00, 0x81], None);
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat)));

        let result = DocumentExtractor::new().extract(b"%PDF-1.4 not really a pdf", None);
        assert!(matches!(result, Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_pdf_without_pages() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();

        let result = DocumentExtractor::new().extract(&data, None);
        assert!(matches!(result, Err(DocumentError::NoPages)));
    }
}
