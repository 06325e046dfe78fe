//! Employer careers-site parser.

use url::Url;

use super::{SourceParser, replace_value};
use crate::extraction::Page;
use crate::extraction::patterns::CAREERS_WORD_SUFFIX;
use crate::models::job::ExtractedFields;
use crate::models::platform::Platform;

/// Parser for postings on the employer's own careers pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyCareersParser;

impl SourceParser for CompanyCareersParser {
    fn name(&self) -> &'static str {
        "company_careers"
    }

    fn can_handle(&self, url: &Url) -> bool {
        Platform::from_url(url) == Platform::Company
    }

    /// Careers sites brand themselves as "Acme Careers".
    fn post_process(&self, fields: &mut ExtractedFields, _page: &Page) {
        if let Some(company) = fields.company.as_str() {
            let stripped = CAREERS_WORD_SUFFIX.replace(company, "").into_owned();
            replace_value(&mut fields.company, stripped);
        }
    }
}
