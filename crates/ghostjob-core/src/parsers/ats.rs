//! Applicant-tracking-system parser (Greenhouse, Lever, Workday and peers).

use url::Url;

use super::{SourceParser, replace_value};
use crate::extraction::layout::{GREENHOUSE_PROFILE, LEVER_PROFILE, WORKDAY_PROFILE};
use crate::extraction::{LayoutProfile, Page};
use crate::models::job::ExtractedFields;
use crate::models::platform::is_ats_host;

/// Parser for postings hosted on an applicant tracking system.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtsParser;

impl SourceParser for AtsParser {
    fn name(&self) -> &'static str {
        "ats"
    }

    fn can_handle(&self, url: &Url) -> bool {
        url.host_str().is_some_and(is_ats_host)
    }

    fn layout_profile(&self, url: &Url) -> Option<&'static LayoutProfile> {
        let host = url.host_str()?;
        if host.ends_with("greenhouse.io") {
            Some(&GREENHOUSE_PROFILE)
        } else if host.ends_with("lever.co") {
            Some(&LEVER_PROFILE)
        } else if host.ends_with("myworkdayjobs.com") {
            Some(&WORKDAY_PROFILE)
        } else {
            None
        }
    }

    fn post_process(&self, fields: &mut ExtractedFields, _page: &Page) {
        // Lever renders "Berlin /" when a commitment follows the location.
        if let Some(location) = fields.location.as_str() {
            let trimmed = location.trim_end_matches(['/', ' ']).to_string();
            replace_value(&mut fields.location, trimmed);
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
        let parser = AtsParser;
        assert!(parser.can_handle(&Url::parse("https://boards.greenhouse.io/acme/jobs/1").unwrap()));
        assert!(parser.can_handle(&Url::parse("https://jobs.lever.co/acme/abc").unwrap()));
        assert!(!parser.can_handle(&Url::parse("https://acme.com/careers").unwrap()));
    }

    #[test]
    fn test_lever_posting() {
        let html = r#"<html><body>
            <div class="posting-headline"><h2>Site Reliability Engineer</h2>
            <div class="posting-categories"><div class="location">Berlin /</div></div></div>
        </body></html>"#;
        let raw = RawSource::new("https://jobs.lever.co/globex/8f0c2a", html);
        let record = AtsParser.parse(&raw);

        assert_eq!(record.title(), "Site Reliability Engineer");
        assert_eq!(record.fields.title.confidence, 0.80);
        assert_eq!(record.location(), Some("Berlin"));
        assert_eq!(record.company(), "Globex");
        assert_eq!(record.fields.company.source, FieldSource::TextPattern);
    }
}
