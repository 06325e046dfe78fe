//! Learned extraction corrections.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::job::JobField;

/// Where a correction applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "snake_case")]
pub enum CorrectionPattern {
    /// A host and all of its subdomains, e.g. `example.com`.
    Domain(String),
    /// A URL pattern where `*` matches any run of characters.
    UrlPattern(String),
}

impl CorrectionPattern {
    /// Key the correction is stored under: the pattern's host without `www.`.
    /// Wildcard host labels are dropped, so `*.globex.com` is stored under
    /// `globex.com`.
    pub fn storage_key(&self) -> String {
        match self {
            CorrectionPattern::Domain(domain) => normalize_host(domain),
            CorrectionPattern::UrlPattern(pattern) => {
                let host = strip_scheme(pattern.trim())
                    .split(['/', '?', '#'])
                    .next()
                    .unwrap_or("");
                let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
                let host = host.split(':').next().unwrap_or("");
                let labels: Vec<&str> = host.split('.').collect();
                let fixed = match labels.iter().rposition(|l| l.contains('*')) {
                    Some(i) => &labels[i + 1..],
                    None => &labels[..],
                };
                normalize_host(&fixed.join("."))
            }
        }
    }

    /// Whether the pattern covers the URL. URL patterns compare hosts
    /// without `www.`, the same way storage keys are derived.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            CorrectionPattern::Domain(domain) => {
                let domain = normalize_host(domain);
                let Some(host) = Url::parse(url.trim())
                    .ok()
                    .and_then(|u| u.host_str().map(normalize_host))
                else {
                    return false;
                };
                host == domain || host.ends_with(&format!(".{}", domain))
            }
            CorrectionPattern::UrlPattern(pattern) => {
                let pattern = pattern.trim();
                let url = url.trim();
                let (pattern, url) = if pattern.contains("://") {
                    (strip_www(pattern), strip_www(url))
                } else {
                    (strip_www(pattern), strip_www(strip_scheme(url)))
                };
                wildcard_regex(&pattern)
                    .map(|re| re.is_match(&url))
                    .unwrap_or(false)
            }
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        match self {
            CorrectionPattern::Domain(domain) => format!("domain {}", domain),
            CorrectionPattern::UrlPattern(pattern) => format!("url {}", pattern),
        }
    }
}

/// Lowercase a host and strip a leading `www.`.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

/// Drop a leading `www.` from the host of a URL or URL pattern.
fn strip_www(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, url),
    };
    let rest = match rest.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &rest[4..],
        _ => rest,
    };
    match scheme {
        Some(scheme) => format!("{}://{}", scheme, rest),
        None => rest.to_string(),
    }
}

fn wildcard_regex(pattern: &str) -> Option<Regex> {
    let escaped: Vec<String> = pattern.trim().split('*').map(regex::escape).collect();
    Regex::new(&format!("(?i)^{}$", escaped.join(".*"))).ok()
}

/// Who supplied a correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionOrigin {
    /// A user fixed the value.
    #[default]
    User,
    /// An automated contextual-learning pass.
    Contextual,
}

/// A learned fact: on matching sources, `original_value` should read `corrected_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Unique identifier.
    pub id: Uuid,

    /// Sources the correction applies to.
    pub pattern: CorrectionPattern,

    /// Parser identity; `None` applies to every parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,

    /// Corrected field.
    pub field: JobField,

    /// Value the parser produced; `None` overrides any value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<String>,

    /// Value it should have produced.
    pub corrected_value: String,

    /// Stored confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Whether a person confirmed the correction.
    pub verified: bool,

    /// Who supplied the correction.
    #[serde(default)]
    pub origin: CorrectionOrigin,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last time the correction was confirmed or changed.
    pub updated_at: DateTime<Utc>,
}

impl Correction {
    /// Create a user correction with the current time.
    pub fn new(
        pattern: CorrectionPattern,
        field: JobField,
        original_value: Option<String>,
        corrected_value: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pattern,
            parser: None,
            field,
            original_value,
            corrected_value: corrected_value.into(),
            confidence,
            verified: false,
            origin: CorrectionOrigin::User,
            created_at: now,
            updated_at: now,
        }
    }

    /// Restrict the correction to one parser.
    pub fn for_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    /// Mark as verified.
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: CorrectionOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Set both timestamps.
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.created_at = time;
        self.updated_at = time;
        self
    }

    /// Storage key for this correction.
    pub fn storage_key(&self) -> String {
        self.pattern.storage_key()
    }

    /// Whether the correction applies to the given parser.
    pub fn applies_to_parser(&self, parser: &str) -> bool {
        self.parser
            .as_deref()
            .is_none_or(|p| p.eq_ignore_ascii_case(parser))
    }

    /// Whether two corrections describe the same fix.
    pub fn same_fix(&self, other: &Correction) -> bool {
        self.pattern == other.pattern
            && self.parser == other.parser
            && self.field == other.field
            && self.original_value == other.original_value
            && self.corrected_value == other.corrected_value
    }
}
