//! Aggregator job board parser.

use url::Url;

use super::{SourceParser, replace_value};
use crate::extraction::layout::{GLASSDOOR_PROFILE, INDEED_PROFILE};
use crate::extraction::patterns::JOB_POST_SUFFIX;
use crate::extraction::{LayoutProfile, Page};
use crate::models::job::ExtractedFields;
use crate::models::platform::Platform;

/// Parser for Indeed, Glassdoor and ZipRecruiter postings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobBoardParser;

impl SourceParser for JobBoardParser {
    fn name(&self) -> &'static str {
        "job_board"
    }

    fn can_handle(&self, url: &Url) -> bool {
        matches!(
            Platform::from_url(url),
            Platform::Indeed | Platform::Glassdoor | Platform::Ziprecruiter
        )
    }

    fn layout_profile(&self, url: &Url) -> Option<&'static LayoutProfile> {
        match Platform::from_url(url) {
            Platform::Indeed => Some(&INDEED_PROFILE),
            Platform::Glassdoor => Some(&GLASSDOOR_PROFILE),
            _ => None,
        }
    }

    fn post_process(&self, fields: &mut ExtractedFields, _page: &Page) {
        if let Some(title) = fields.title.as_str() {
            let stripped = JOB_POST_SUFFIX.replace(title, "").into_owned();
            replace_value(&mut fields.title, stripped);
        }
    }
}
