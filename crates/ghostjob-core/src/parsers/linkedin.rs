//! Professional network parser.

use url::Url;

use super::{SourceParser, replace_value};
use crate::extraction::layout::LINKEDIN_PROFILE;
use crate::extraction::patterns::LINKEDIN_HIRING_TITLE;
use crate::extraction::{LayoutProfile, Page};
use crate::models::job::{ExtractedFields, ExtractionField};

/// Parser for LinkedIn job views.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedInParser;

impl SourceParser for LinkedInParser {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    fn version(&self) -> &'static str {
        "1.1.0"
    }

    fn can_handle(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|h| h == "linkedin.com" || h.ends_with(".linkedin.com"))
    }

    fn layout_profile(&self, _url: &Url) -> Option<&'static LayoutProfile> {
        Some(&LINKEDIN_PROFILE)
    }

    /// Split share titles of the form "Acme hiring Data Engineer in Austin, TX".
    fn post_process(&self, fields: &mut ExtractedFields, _page: &Page) {
        let Some(title) = fields.title.as_str().map(str::to_string) else {
            return;
        };
        let Some(caps) = LINKEDIN_HIRING_TITLE.captures(&title) else {
            return;
        };

        let confidence = fields.title.confidence;
        let source = fields.title.source;
        replace_value(&mut fields.title, caps["title"].to_string());

        if fields.company.confidence < confidence {
            fields.company = ExtractionField::new(&caps["company"], confidence, source);
        }
        if let Some(location) = caps.name("location") {
            if fields.location.confidence < confidence {
                fields.location = ExtractionField::new(location.as_str(), confidence, source);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{FieldSource, RawSource};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_can_handle() {
        let parser = LinkedInParser;
        assert!(parser.can_handle(&Url::parse("https://www.linkedin.com/jobs/view/1").unwrap()));
        assert!(parser.can_handle(&Url::parse("https://uk.linkedin.com/jobs/view/1").unwrap()));
        assert!(!parser.can_handle(&Url::parse("https://notlinkedin.com/jobs").unwrap()));
    }

    #[test]
    fn test_share_title_is_split() {
        let html = r#"<html><head>
            <meta property="og:title" content="Globex hiring Data Engineer in Austin, TX | LinkedIn">
            </head><body></body></html>"#;
        let raw = RawSource::new("https://www.linkedin.com/jobs/view/3812345678", html);
        let record = LinkedInParser.parse(&raw);

        assert_eq!(record.title(), "Data Engineer");
        assert_eq!(record.company(), "Globex");
        assert_eq!(record.location(), Some("Austin, TX"));
        assert_eq!(record.fields.company.source, FieldSource::Layout);
        assert_eq!(record.metadata.parser_name, "linkedin");
    }

    #[test]
    fn test_top_card_markup() {
        let html = r#"<html><body>
            <h1 class="top-card-layout__title">Senior Backend Engineer</h1>
            <a class="topcard__org-name-link">Initech, Inc.</a>
            <span class="topcard__flavor--bullet">Remote</span>
        </body></html>"#;
        let raw = RawSource::new(
            "https://www.linkedin.com/jobs/view/senior-backend-engineer-at-initech-3812345678",
            html,
        );
        let record = LinkedInParser.parse(&raw);

        assert_eq!(record.title(), "Senior Backend Engineer");
        assert_eq!(record.company(), "Initech");
        assert_eq!(record.fields.title.confidence, 0.80);
    }
}
