//! URL keys for duplicate matching.
//!
//! [`exact_url_key`] only removes what never changes the document (fragment,
//! trailing slash, host case). [`canonicalize_url`] additionally folds
//! tracking parameters, `www.`, scheme and platform-specific job id
//! spellings, so two URLs with the same canonical form point to the same
//! posting.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;
use url::form_urlencoded;

use crate::error::ExtractionError;

lazy_static! {
    // /jobs/view/3812345678 and /jobs/view/data-engineer-at-acme-3812345678
    static ref LINKEDIN_JOB_PATH: Regex = Regex::new(
        r"^/jobs/view/(?:[^/]*-)?(\d{5,})/?$"
    ).unwrap();
}

/// Query parameters that only carry attribution state.
const TRACKING_PARAMS: &[&str] = &[
    "gclid",
    "fbclid",
    "msclkid",
    "trk",
    "trkinfo",
    "trackingid",
    "refid",
    "ref",
    "referrer",
    "src",
    "source",
    "from",
    "mc_cid",
    "mc_eid",
    "_hsenc",
    "_hsmi",
    "li_fat_id",
    "gh_src",
    "lever-source",
    "lever-origin",
    "lipi",
    "originalsubdomain",
    "_ga",
    "igshid",
    "yclid",
    "dclid",
];

/// Search-result pagination parameters, per host. Elsewhere the same names
/// can select the posting itself.
const PAGINATION_PARAMS: &[(&str, &[&str])] = &[("linkedin.com", &["position", "pagenum"])];

/// Whether a query parameter is tracking noise.
pub fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

fn is_pagination_param(host: &str, name: &str) -> bool {
    let lower = name.to_lowercase();
    PAGINATION_PARAMS.iter().any(|(domain, params)| {
        (host == *domain || host.ends_with(&format!(".{}", domain)))
            && params.contains(&lower.as_str())
    })
}

fn parse_url(raw: &str) -> Result<Url, ExtractionError> {
    let trimmed = raw.trim();
    let invalid = |reason: String| ExtractionError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("empty URL".to_string()));
    }
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Exact-match key: the URL without fragment or trailing slash.
pub fn exact_url_key(raw: &str) -> Result<String, ExtractionError> {
    let mut url = parse_url(raw)?;
    url.set_fragment(None);
    trim_path(&mut url);
    Ok(finish(url))
}

/// Canonical form used for cross-posting and re-share matching.
pub fn canonicalize_url(raw: &str) -> Result<String, ExtractionError> {
    let mut url = parse_url(raw)?;
    url.set_fragment(None);
    let _ = url.set_scheme("https");
    let _ = url.set_port(None);

    let lower = url.host_str().unwrap_or_default().to_lowercase();
    let mut host = lower.strip_prefix("www.").unwrap_or(&lower).to_string();
    if host.ends_with(".linkedin.com") {
        // Country subdomains (uk., de.) serve the same posting.
        host = "linkedin.com".to_string();
    }
    url.set_host(Some(&host))
        .map_err(|e| ExtractionError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if host == "linkedin.com" {
        if let Some(id) = linkedin_job_id(&url, &pairs) {
            url.set_path(&format!("/jobs/view/{}", id));
            url.set_query(None);
            return Ok(finish(url));
        }
    }

    if host == "indeed.com" || host.ends_with(".indeed.com") {
        let job_key = find_param(&pairs, "jk").or_else(|| find_param(&pairs, "vjk"));
        if let Some(job_key) = job_key {
            url.set_path("/viewjob");
            set_query(&mut url, vec![("jk".to_string(), job_key)]);
            return Ok(finish(url));
        }
    }

    let path = url.path().to_string();
    let mut kept: Vec<(String, String)> = pairs
        .into_iter()
        .filter(|(k, _)| !is_tracking_param(k) && !is_pagination_param(&host, k))
        .filter(|(k, v)| !(k == "gh_jid" && host.ends_with("greenhouse.io") && path.contains(v.as_str())))
        .collect();
    kept.sort();

    set_query(&mut url, kept);
    trim_path(&mut url);
    Ok(finish(url))
}

fn linkedin_job_id(url: &Url, pairs: &[(String, String)]) -> Option<String> {
    find_param(pairs, "currentJobId")
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
        .or_else(|| {
            LINKEDIN_JOB_PATH
                .captures(url.path())
                .map(|caps| caps[1].to_string())
        })
}

fn find_param(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn set_query(url: &mut Url, pairs: Vec<(String, String)>) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    url.set_query(Some(&query));
}

fn trim_path(url: &mut Url) {
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
}

fn finish(url: Url) -> String {
    let mut key = url.to_string();
    if url.query().is_none() && key.ends_with('/') {
        key.pop();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exact_key() {
        assert_eq!(
            exact_url_key("https://Example.com/jobs/1/#apply").unwrap(),
            "https://example.com/jobs/1"
        );
        assert_eq!(
            exact_url_key("https://example.com/jobs?id=1").unwrap(),
            "https://example.com/jobs?id=1"
        );
        // Tracking parameters still distinguish exact keys.
        assert_ne!(
            exact_url_key("https://example.com/jobs/1?utm_source=x").unwrap(),
            exact_url_key("https://example.com/jobs/1").unwrap()
        );
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(
            exact_url_key(""),
            Err(ExtractionError::InvalidUrl { .. })
        ));
        assert!(canonicalize_url("not a url").is_err());
        assert!(canonicalize_url("ftp://example.com/job").is_err());
    }

    #[test]
    fn test_tracking_params_removed_and_sorted() {
        assert_eq!(
            canonicalize_url("http://www.acme.com/careers/42/?utm_source=li&b=2&ref=abc&a=1")
                .unwrap(),
            "https://acme.com/careers/42?a=1&b=2"
        );
        assert!(is_tracking_param("UTM_Campaign"));
        assert!(!is_tracking_param("jk"));
    }

    #[test]
    fn test_linkedin_variants_converge() {
        let expected = "https://linkedin.com/jobs/view/3812345678";
        for raw in [
            "https://www.linkedin.com/jobs/view/3812345678/?trk=public_jobs",
            "https://uk.linkedin.com/jobs/view/data-engineer-at-acme-3812345678",
            "https://www.linkedin.com/jobs/search/?currentJobId=3812345678&keywords=data",
        ] {
            assert_eq!(canonicalize_url(raw).unwrap(), expected, "{}", raw);
        }
    }

    #[test]
    fn test_position_is_only_pagination_on_linkedin() {
        assert_ne!(
            canonicalize_url("https://careers.acme.com/apply?position=101").unwrap(),
            canonicalize_url("https://careers.acme.com/apply?position=202").unwrap()
        );
        assert_eq!(
            canonicalize_url("https://careers.acme.com/apply?position=101&utm_medium=email").unwrap(),
            "https://careers.acme.com/apply?position=101"
        );
        assert_eq!(
            canonicalize_url("https://www.linkedin.com/jobs/search/?keywords=rust&position=3&pageNum=0")
                .unwrap(),
            "https://linkedin.com/jobs/search?keywords=rust"
        );
    }

    #[test]
    fn test_indeed_job_key() {
        assert_eq!(
            canonicalize_url("https://www.indeed.com/jobs?q=rust&vjk=4f2a9c&from=serp").unwrap(),
            "https://indeed.com/viewjob?jk=4f2a9c"
        );
        assert_eq!(
            canonicalize_url("https://indeed.com/viewjob?jk=4f2a9c&tk=1h2").unwrap(),
            "https://indeed.com/viewjob?jk=4f2a9c"
        );
    }

    #[test]
    fn test_greenhouse_redundant_job_id() {
        assert_eq!(
            canonicalize_url("https://boards.greenhouse.io/acme/jobs/4012345?gh_jid=4012345")
                .unwrap(),
            "https://boards.greenhouse.io/acme/jobs/4012345"
        );
        assert_eq!(
            canonicalize_url("https://acme.com/careers?gh_jid=4012345").unwrap(),
            "https://acme.com/careers?gh_jid=4012345"
        );
    }
}
