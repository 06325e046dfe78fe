//! Post-processing of extracted values.

use url::Url;

use super::patterns::{
    JOB_APPLICATION_PREFIX, LEGAL_SUFFIX, RATING_ARTIFACT, SITE_SUFFIX, TRAILING_DIGITS,
    is_bogus_title,
};
use super::{collapse_whitespace, title_case_slug};
use crate::models::platform::ATS_HOSTS;

/// Host labels that never name an employer.
const GENERIC_LABELS: &[&str] = &[
    "www", "careers", "career", "jobs", "job", "apply", "boards", "job-boards", "app", "hire",
    "recruiting", "talent", "work", "en",
];

/// Subdomain prefixes used by employer careers sites.
const CAREERS_PREFIXES: &[&str] = &["careers.", "jobs.", "apply.", "work.", "talent."];

/// Clean a company name: ratings, digit artifacts, site and legal suffixes.
pub fn clean_company(raw: &str) -> String {
    let mut company = collapse_whitespace(raw);
    company = RATING_ARTIFACT.replace(&company, "").into_owned();
    company = SITE_SUFFIX.replace(&company, "").into_owned();

    if company.chars().any(char::is_alphabetic) {
        let stripped = TRAILING_DIGITS.replace(&company, "").into_owned();
        if !stripped.trim().is_empty() {
            company = stripped;
        }
    }

    // "Acme Holdings, Inc." carries at most two stacked suffixes.
    for _ in 0..2 {
        let stripped = LEGAL_SUFFIX.replace(&company, "").into_owned();
        if stripped.trim().is_empty() || stripped == company {
            break;
        }
        company = stripped;
    }

    collapse_whitespace(company.trim_matches(|c: char| c == ',' || c == '-' || c == '|'))
}

/// Clean a job title, removing application prefixes, site suffixes and an
/// embedded company name.
pub fn clean_title(raw: &str, company: Option<&str>) -> String {
    let mut title = collapse_whitespace(raw);
    title = JOB_APPLICATION_PREFIX.replace(&title, "").into_owned();
    title = SITE_SUFFIX.replace(&title, "").into_owned();

    if let Some(company) = company.map(str::trim).filter(|c| c.len() >= 2) {
        title = strip_embedded_company(&title, company);
    }

    collapse_whitespace(&title)
}

/// Whether a cleaned title is usable.
pub fn is_valid_title(title: &str) -> bool {
    !is_bogus_title(title) && title.chars().any(char::is_alphabetic)
}

fn strip_embedded_company(title: &str, company: &str) -> String {
    let lower_title = title.to_lowercase();
    let lower_company = company.to_lowercase();
    if lower_title.len() != title.len() {
        return title.to_string();
    }

    for sep in [" at ", " - ", " | ", " @ ", ", "] {
        let suffix = format!("{}{}", sep, lower_company);
        if lower_title.ends_with(&suffix) {
            if let Some(rest) = title.get(..title.len() - suffix.len()) {
                return rest.to_string();
            }
        }
    }

    for sep in [" - ", " | ", ": "] {
        let prefix = format!("{}{}", lower_company, sep);
        if lower_title.starts_with(&prefix) {
            if let Some(rest) = title.get(prefix.len()..) {
                return rest.to_string();
            }
        }
    }

    title.to_string()
}

/// Guess the employer from a careers or ATS subdomain
/// (`careers.acme.com`, `acme.wd5.myworkdayjobs.com`).
pub fn company_from_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();

    let label = if let Some(ats) = ATS_HOSTS
        .iter()
        .find(|ats| host.ends_with(&format!(".{}", ats)))
    {
        let prefix = &host[..host.len() - ats.len() - 1];
        prefix.split('.').next()?.to_string()
    } else {
        let rest = CAREERS_PREFIXES
            .iter()
            .find_map(|prefix| host.strip_prefix(prefix))?;
        rest.split('.').next()?.to_string()
    };

    if label.len() < 2 || GENERIC_LABELS.contains(&label.as_str()) {
        return None;
    }
    Some(title_case_slug(&label))
}

/// Guess a title from the last descriptive path segment
/// (`/openings/senior-backend-engineer`).
pub fn title_from_path(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;

    if segment.contains('.') {
        return None;
    }

    let words: Vec<&str> = segment.split(['-', '_']).filter(|w| !w.is_empty()).collect();
    let alphabetic: Vec<&str> = words
        .iter()
        .copied()
        .filter(|w| w.chars().all(char::is_alphabetic))
        .collect();
    if alphabetic.len() < 2 || alphabetic.len() * 2 < words.len() {
        return None;
    }

    let title = title_case_slug(&alphabetic.join("-"));
    is_valid_title(&title).then_some(title)
}
