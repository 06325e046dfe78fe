//! Layout-based extraction: selecting elements by structural role.

use super::patterns::{TITLE_AT_COMPANY, TITLE_SEPARATORS};
use super::{ExtractionStrategy, Page};
use crate::models::job::{ExtractedFields, ExtractionField, FieldSource};
use crate::models::platform::Platform;

/// Confidence for values split out of `og:title` or `<title>`.
const PAGE_TITLE_CONFIDENCE: f32 = 0.55;

/// Site names that end page titles and are never the employer.
const SITE_NAMES: &[&str] = &[
    "linkedin",
    "indeed",
    "indeed.com",
    "glassdoor",
    "ziprecruiter",
    "greenhouse",
    "lever",
    "workday",
    "careers",
    "jobs",
];

/// Selectors known to hold job fields on one family of pages.
#[derive(Debug, Clone, Copy)]
pub struct LayoutProfile {
    /// Profile name for logs.
    pub name: &'static str,
    /// Confidence assigned to values found with this profile.
    pub confidence: f32,
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub location: &'static [&'static str],
    pub description: &'static [&'static str],
}

pub const LINKEDIN_PROFILE: LayoutProfile = LayoutProfile {
    name: "linkedin",
    confidence: 0.80,
    title: &[
        ".top-card-layout__title",
        "h1.topcard__title",
        ".job-details-jobs-unified-top-card__job-title",
    ],
    company: &[
        ".topcard__org-name-link",
        ".topcard__flavor a",
        ".job-details-jobs-unified-top-card__company-name",
    ],
    location: &[
        ".topcard__flavor--bullet",
        ".job-details-jobs-unified-top-card__bullet",
    ],
    description: &[".show-more-less-html__markup", ".description__text", "#job-details"],
};

pub const GREENHOUSE_PROFILE: LayoutProfile = LayoutProfile {
    name: "greenhouse",
    confidence: 0.80,
    title: &["h1.app-title", ".job__title h1", "#header h1"],
    company: &[".company-name", "#header .company-name"],
    location: &[".job__location", "#header .location", ".location"],
    description: &[".job__description", "#content"],
};

pub const LEVER_PROFILE: LayoutProfile = LayoutProfile {
    name: "lever",
    confidence: 0.80,
    title: &[".posting-headline h2", ".posting-header h2"],
    company: &[],
    location: &[".posting-categories .location", ".sort-by-location"],
    description: &["[data-qa=job-description]", ".section-wrapper.page-full-width"],
};

pub const WORKDAY_PROFILE: LayoutProfile = LayoutProfile {
    name: "workday",
    confidence: 0.80,
    title: &["[data-automation-id=jobPostingHeader]"],
    company: &[],
    location: &["[data-automation-id=locations] dd", "[data-automation-id=locations]"],
    description: &["[data-automation-id=jobPostingDescription]"],
};

pub const INDEED_PROFILE: LayoutProfile = LayoutProfile {
    name: "indeed",
    confidence: 0.80,
    title: &[
        "[data-testid=jobsearch-JobInfoHeader-title]",
        "h1.jobsearch-JobInfoHeader-title",
    ],
    company: &["[data-testid=inlineHeader-companyName]", "[data-company-name]"],
    location: &[
        "[data-testid=inlineHeader-companyLocation]",
        "[data-testid=job-location]",
    ],
    description: &["#jobDescriptionText"],
};

pub const GLASSDOOR_PROFILE: LayoutProfile = LayoutProfile {
    name: "glassdoor",
    confidence: 0.80,
    title: &["[data-test=job-title]", "[data-test=jobTitle]"],
    company: &["[data-test=employer-name]", "[data-test=employerName]"],
    location: &["[data-test=location]"],
    description: &[".jobDescriptionContent", "[class*=JobDetails_jobDescription]"],
};

pub const GENERIC_PROFILE: LayoutProfile = LayoutProfile {
    name: "generic",
    confidence: 0.60,
    title: &[
        "[itemprop=title]",
        "h1.job-title",
        ".job-title",
        ".posting-title",
        "h1",
    ],
    company: &[
        "[itemprop=hiringOrganization]",
        ".company-name",
        ".employer-name",
        ".company",
    ],
    location: &["[itemprop=jobLocation]", ".job-location", ".location"],
    description: &[
        "[itemprop=description]",
        "#job-description",
        ".job-description",
        ".description",
        "article",
        "main",
    ],
};

/// Selects elements by structural role using a platform profile, then the
/// generic profile, then the page title.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutStrategy {
    profile: Option<&'static LayoutProfile>,
}

impl LayoutStrategy {
    /// Create a strategy using only the generic profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try a platform profile before the generic one.
    pub fn with_profile(mut self, profile: &'static LayoutProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    fn apply_profile(&self, page: &Page, profile: &LayoutProfile, fields: &mut ExtractedFields) {
        let found = |value: Option<String>| {
            value
                .map(|v| ExtractionField::new(v, profile.confidence, FieldSource::Layout))
                .unwrap_or_default()
        };

        if fields.title.value.is_none() {
            fields.title = found(page.select_text(profile.title));
        }
        if fields.company.value.is_none() {
            fields.company = found(page.select_text(profile.company));
        }
        if fields.location.value.is_none() {
            fields.location = found(page.select_text(profile.location));
        }
        if fields.description.value.is_none() {
            fields.description = found(page.select_block(profile.description));
        }
    }

    fn apply_page_title(&self, page: &Page, fields: &mut ExtractedFields) {
        let (title, company) = page
            .meta("og:title")
            .or_else(|| page.document_title())
            .map(|raw| split_page_title(&raw))
            .unwrap_or((None, None));
        if fields.title.value.is_none() {
            if let Some(title) = title {
                fields.title = ExtractionField::new(title, PAGE_TITLE_CONFIDENCE, FieldSource::Layout);
            }
        }
        if fields.company.value.is_none() {
            let company = company.or_else(|| {
                // Employer sites commonly announce themselves in og:site_name.
                matches!(page.platform, Platform::Company)
                    .then(|| page.meta("og:site_name"))
                    .flatten()
                    .filter(|name| !is_site_name(name))
            });
            if let Some(company) = company {
                fields.company =
                    ExtractionField::new(company, PAGE_TITLE_CONFIDENCE, FieldSource::Layout);
            }
        }
    }
}

impl ExtractionStrategy for LayoutStrategy {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn source(&self) -> FieldSource {
        FieldSource::Layout
    }

    fn extract(&self, page: &Page) -> ExtractedFields {
        let mut fields = ExtractedFields::default();
        if page.html.is_none() {
            return fields;
        }

        if let Some(profile) = self.profile {
            self.apply_profile(page, profile, &mut fields);
        }
        self.apply_profile(page, &GENERIC_PROFILE, &mut fields);
        self.apply_page_title(page, &mut fields);

        fields
    }
}

/// Split a page title such as "Engineer at Acme | LinkedIn" or
/// "Engineer - Acme" into title and company.
pub fn split_page_title(raw: &str) -> (Option<String>, Option<String>) {
    let mut parts: Vec<&str> = TITLE_SEPARATORS
        .split(raw.trim())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    while parts.len() > 1 && parts.last().is_some_and(|p| is_site_name(p)) {
        parts.pop();
    }

    let Some(first) = parts.first() else {
        return (None, None);
    };

    if let Some(caps) = TITLE_AT_COMPANY.captures(first) {
        return (
            Some(caps["title"].to_string()),
            Some(caps["company"].to_string()),
        );
    }

    let company = parts
        .get(1)
        .filter(|p| !is_site_name(p))
        .map(|p| p.to_string());
    (Some(first.to_string()), company)
}

fn is_site_name(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    SITE_NAMES.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::RawSource;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_platform_profile_outranks_generic() {
        let html = r#"<html><body>
            <h1 class="top-card-layout__title">Data Engineer</h1>
            <a class="topcard__org-name-link">Acme Corp</a>
            <span class="topcard__flavor--bullet">Austin, TX</span>
            <div class="description__text"><p>Pipelines.</p><p>Spark.</p></div>
        </body></html>"#;
        let raw = RawSource::new("https://www.linkedin.com/jobs/view/123456789", html);
        let fields = LayoutStrategy::new()
            .with_profile(&LINKEDIN_PROFILE)
            .attempt(&raw);

        assert_eq!(fields.title.as_str(), Some("Data Engineer"));
        assert_eq!(fields.title.confidence, 0.80);
        assert_eq!(fields.company.as_str(), Some("Acme Corp"));
        assert_eq!(fields.location.as_str(), Some("Austin, TX"));
        assert_eq!(fields.description.as_str(), Some("Pipelines.\nSpark."));
    }

    #[test]
    fn test_generic_profile_confidence() {
        let html = r#"<html><body><h1>Platform Engineer</h1>
            <div class="company-name">Initech</div></body></html>"#;
        let raw = RawSource::new("https://initech.com/careers/platform", html);
        let fields = LayoutStrategy::new().attempt(&raw);

        assert_eq!(fields.title.as_str(), Some("Platform Engineer"));
        assert_eq!(fields.title.confidence, 0.60);
        assert_eq!(fields.company.as_str(), Some("Initech"));
    }

    #[test]
    fn test_page_title_fallback() {
        let html = r#"<html><head><title>Staff Engineer at Globex | LinkedIn</title></head>
            <body><p>nothing structured</p></body></html>"#;
        let raw = RawSource::new("https://www.linkedin.com/jobs/view/1", html);
        let fields = LayoutStrategy::new().attempt(&raw);

        assert_eq!(fields.title.as_str(), Some("Staff Engineer"));
        assert_eq!(fields.company.as_str(), Some("Globex"));
        assert_eq!(fields.company.confidence, 0.55);
    }

    #[test]
    fn test_split_page_title() {
        assert_eq!(
            split_page_title("Backend Engineer - Acme"),
            (Some("Backend Engineer".to_string()), Some("Acme".to_string()))
        );
        assert_eq!(
            split_page_title("Careers | Jobs"),
            (Some("Careers".to_string()), None)
        );
    }

    #[test]
    fn test_plain_text_is_skipped() {
        let raw = RawSource::new("", "Job Title: Engineer");
        assert!(LayoutStrategy::new().attempt(&raw).is_empty());
    }
}
