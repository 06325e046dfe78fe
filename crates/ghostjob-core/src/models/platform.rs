//! Source platform detection.

use serde::{Deserialize, Serialize};
use url::Url;

/// Hosts of applicant tracking systems that serve employer-owned postings.
pub const ATS_HOSTS: &[&str] = &[
    "greenhouse.io",
    "lever.co",
    "myworkdayjobs.com",
    "ashbyhq.com",
    "smartrecruiters.com",
    "workable.com",
    "bamboohr.com",
    "icims.com",
    "jobvite.com",
    "breezy.hr",
    "recruitee.com",
];

/// Job platform a posting was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Professional network.
    Linkedin,
    /// Indeed job board.
    Indeed,
    /// Glassdoor job board.
    Glassdoor,
    /// ZipRecruiter job board.
    Ziprecruiter,
    /// Applicant tracking system hosting an employer posting.
    Ats,
    /// Employer careers site.
    Company,
    /// Anything else.
    Other,
}

impl Platform {
    /// Detect the platform from a raw URL string.
    pub fn detect(raw_url: &str) -> Self {
        match Url::parse(raw_url.trim()) {
            Ok(url) => Self::from_url(&url),
            Err(_) => Platform::Other,
        }
    }

    /// Detect the platform from a parsed URL.
    pub fn from_url(url: &Url) -> Self {
        let host = url.host_str().unwrap_or("").to_lowercase();
        let path = url.path().to_lowercase();

        if host.contains("linkedin") {
            Platform::Linkedin
        } else if host.contains("indeed") {
            Platform::Indeed
        } else if host.contains("glassdoor") {
            Platform::Glassdoor
        } else if host.contains("ziprecruiter") {
            Platform::Ziprecruiter
        } else if is_ats_host(&host) {
            Platform::Ats
        } else if host.starts_with("careers.")
            || host.starts_with("jobs.")
            || path.contains("/careers")
            || path.contains("/jobs")
        {
            Platform::Company
        } else {
            Platform::Other
        }
    }

    /// Preference rank when choosing the canonical copy of a duplicated posting.
    pub fn preference_rank(&self) -> u8 {
        match self {
            Platform::Company => 4,
            Platform::Ats => 3,
            Platform::Linkedin => 2,
            Platform::Indeed | Platform::Glassdoor | Platform::Ziprecruiter => 1,
            Platform::Other => 0,
        }
    }

    /// Whether the platform is owned by (or acts for) the employer.
    pub fn is_employer_hosted(&self) -> bool {
        matches!(self, Platform::Company | Platform::Ats)
    }

    /// Whether the platform aggregates postings from many employers.
    pub fn is_job_board(&self) -> bool {
        matches!(
            self,
            Platform::Linkedin | Platform::Indeed | Platform::Glassdoor | Platform::Ziprecruiter
        )
    }

    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::Indeed => "indeed",
            Platform::Glassdoor => "glassdoor",
            Platform::Ziprecruiter => "ziprecruiter",
            Platform::Ats => "ats",
            Platform::Company => "company",
            Platform::Other => "other",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a host belongs to a known applicant tracking system.
pub fn is_ats_host(host: &str) -> bool {
    ATS_HOSTS
        .iter()
        .any(|ats| host == *ats || host.ends_with(&format!(".{}", ats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platforms() {
        assert_eq!(
            Platform::detect("https://www.linkedin.com/jobs/view/123"),
            Platform::Linkedin
        );
        assert_eq!(
            Platform::detect("https://www.indeed.com/viewjob?jk=abc"),
            Platform::Indeed
        );
        assert_eq!(
            Platform::detect("https://boards.greenhouse.io/acme/jobs/42"),
            Platform::Ats
        );
        assert_eq!(
            Platform::detect("https://acme.wd5.myworkdayjobs.com/en-US/External/job/x"),
            Platform::Ats
        );
        assert_eq!(Platform::detect("https://careers.acme.com/eng"), Platform::Company);
        assert_eq!(Platform::detect("https://example.com/jobs/1"), Platform::Company);
        assert_eq!(Platform::detect("https://example.com/about"), Platform::Other);
        assert_eq!(Platform::detect("not a url"), Platform::Other);
    }

    #[test]
    fn test_preference_rank_orders_employer_first() {
        assert!(Platform::Company.preference_rank() > Platform::Linkedin.preference_rank());
        assert!(Platform::Linkedin.preference_rank() > Platform::Indeed.preference_rank());
        assert!(Platform::Indeed.preference_rank() > Platform::Other.preference_rank());
    }
}
