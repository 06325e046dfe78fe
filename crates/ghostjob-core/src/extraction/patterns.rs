//! Common regex patterns for job posting extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Labelled lines ("Job Title: ...", "Company: ...")
    pub static ref TITLE_LABEL: Regex = Regex::new(
        r"(?im)^[ \t]*(?:job\s+title|position(?:\s+title)?|role|title)[ \t]*[:\-][ \t]*\n?[ \t]*(\S.{1,150}?)[ \t]*$"
    ).unwrap();

    pub static ref COMPANY_LABEL: Regex = Regex::new(
        r"(?im)^[ \t]*(?:company(?:\s+name)?|employer|organi[sz]ation|hiring\s+company)[ \t]*[:\-][ \t]*\n?[ \t]*(\S.{0,100}?)[ \t]*$"
    ).unwrap();

    pub static ref LOCATION_LABEL: Regex = Regex::new(
        r"(?im)^[ \t]*(?:location|job\s+location|work\s+location|based\s+in)[ \t]*[:\-][ \t]*\n?[ \t]*(\S.{1,100}?)[ \t]*$"
    ).unwrap();

    // Hiring phrasing ("Acme is hiring a Senior Engineer", "Join Acme as a ...")
    pub static ref IS_HIRING: Regex = Regex::new(
        r"(?m)\b([A-Z][\w&.'\-]*(?:\s+[A-Z][\w&.'\-]*){0,4})\s+is\s+hiring(?:\s+an?)?\s+([A-Z][^\n.!,;]{2,80})"
    ).unwrap();

    pub static ref JOIN_AS: Regex = Regex::new(
        r"(?m)\bJoin\s+([A-Z][\w&.'\-]*(?:\s+[A-Z][\w&.'\-]*){0,4})\s+as\s+(?:an?\s+)?([A-Z][^\n.!,;]{2,80})"
    ).unwrap();

    // "<Title> at <Company>" and "<Title> - <Company> | <Site>" page titles
    pub static ref TITLE_AT_COMPANY: Regex = Regex::new(
        r"^(?P<title>.+?)\s+at\s+(?P<company>.+?)$"
    ).unwrap();

    pub static ref TITLE_SEPARATORS: Regex = Regex::new(
        r"\s+[|\-–—·:]\s+"
    ).unwrap();

    // Platform title shapes ("Acme hiring Data Engineer in Austin, TX")
    pub static ref LINKEDIN_HIRING_TITLE: Regex = Regex::new(
        r"^(?P<company>.+?)\s+hiring\s+(?P<title>.+?)(?:\s+in\s+(?P<location>.+))?$"
    ).unwrap();

    pub static ref JOB_POST_SUFFIX: Regex = Regex::new(
        r"(?i)\s*[-|]\s*job\s+post(?:ing)?\s*$"
    ).unwrap();

    pub static ref CAREERS_WORD_SUFFIX: Regex = Regex::new(
        r"(?i)\s+(?:careers?|jobs)$"
    ).unwrap();

    // URL slug shapes
    pub static ref LINKEDIN_SLUG: Regex = Regex::new(
        r"^/jobs/view/(?P<title>[a-z0-9\-]+?)-at-(?P<company>[a-z0-9\-]+?)-(?P<id>\d{6,})/?$"
    ).unwrap();

    pub static ref WORKDAY_JOB: Regex = Regex::new(
        r"/job/(?:[^/]+/)?(?P<title>[A-Za-z0-9\-]+?)_[A-Za-z0-9\-]+/?$"
    ).unwrap();

    // Company name cleanup
    pub static ref LEGAL_SUFFIX: Regex = Regex::new(
        r"(?i)[,\s]+(?:inc|incorporated|llc|l\.l\.c|ltd|limited|corp|corporation|co|gmbh|plc|s\.a|sa|ag|bv|pty|llp)\.?$"
    ).unwrap();

    pub static ref RATING_ARTIFACT: Regex = Regex::new(
        r"\s*(?:\d(?:\.\d)?\s*★|★+|\d\.\d\s*(?:stars?)?)\s*$"
    ).unwrap();

    // Id artifacts only: "Umbrella-42", "Umbrella 12345"; keeps "Fortune 500".
    pub static ref TRAILING_DIGITS: Regex = Regex::new(
        r"(?:\s*[\-_]+\s*\d+|\s+\d{4,})$"
    ).unwrap();

    pub static ref JOB_APPLICATION_PREFIX: Regex = Regex::new(
        r"(?i)^(?:job\s+application\s+for|apply\s+for|application\s+for)\s+"
    ).unwrap();

    pub static ref SITE_SUFFIX: Regex = Regex::new(
        r"(?i)\s*[|\-–—]\s*(?:linkedin|indeed(?:\.com)?|glassdoor|ziprecruiter|greenhouse|lever|workday|careers?|jobs?)\s*$"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Posting dates in free text ("Posted: 2024-01-15")
    pub static ref POSTED_DATE: Regex = Regex::new(
        r"(?i)\b(?:date\s+posted|posted(?:\s+on)?|published(?:\s+on)?)[ \t]*:?[ \t]*(\d{4}-\d{2}-\d{2})\b"
    ).unwrap();
}

/// Page titles and headings that are never a job title.
pub const BOGUS_TITLES: &[&str] = &[
    "careers",
    "career",
    "jobs",
    "job",
    "apply",
    "apply now",
    "job details",
    "job description",
    "open positions",
    "current openings",
    "join us",
    "join our team",
    "home",
    "sign in",
    "log in",
    "404",
    "page not found",
];

/// Check whether a candidate title is boilerplate.
pub fn is_bogus_title(title: &str) -> bool {
    let lower = title.trim().to_lowercase();
    lower.len() < 3 || BOGUS_TITLES.contains(&lower.as_str())
}
