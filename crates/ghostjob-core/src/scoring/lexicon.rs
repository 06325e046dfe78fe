//! Phrase lists and patterns behind the scoring rules.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Roles that legitimately stay open for months
    pub static ref EXCEPTION_TITLE: Regex = Regex::new(
        r"(?i)\b(?:government|federal|public\s+sector|civil\s+service|professor|faculty|lecturer|postdoc(?:toral)?|research\s+fellow|dean|provost|chief\s+\w+\s+officer|ceo|cfo|cto|coo|cio|svp|evp|vice\s+president|executive\s+director|president)\b"
    ).unwrap();

    pub static ref EXCEPTION_COMPANY: Regex = Regex::new(
        r"(?i)\b(?:university|college|department\s+of|ministry|government|county\s+of|city\s+of|state\s+of|school\s+district|public\s+schools)\b"
    ).unwrap();

    // Indefinite talent pipelines
    pub static ref PIPELINE_LANGUAGE: Regex = Regex::new(
        r"(?i)\b(?:always\s+(?:accepting|looking|hiring)|building\s+(?:a|our)\s+(?:talent\s+)?pipeline|talent\s+(?:pool|pipeline|community)|future\s+(?:opportunities|openings|roles)|evergreen\s+(?:role|position|requisition)|general\s+application|on\s+a\s+rolling\s+basis|no\s+(?:current|specific)\s+(?:opening|vacancy|vacancies)|continuously\s+(?:hiring|recruiting|accepting))\b"
    ).unwrap();

    // Concrete hiring details
    pub static ref COMPENSATION: Regex = Regex::new(
        r"(?i)(?:[$€£]\s?\d[\d,.]*\s?k?\b|\b\d[\d,.]*\s?(?:usd|eur|gbp)\b|\bsalary(?:\s+range)?\s*[:\-]|\bcompensation\s*[:\-]|\bper\s+(?:hour|year|annum)\b)"
    ).unwrap();

    pub static ref DEADLINE: Regex = Regex::new(
        r"(?i)\b(?:apply\s+(?:by|before)|applications?\s+(?:close|due)|application\s+deadline|deadline|closing\s+date|closes\s+on)\b"
    ).unwrap();

    pub static ref TIMELINE: Regex = Regex::new(
        r"(?i)\b(?:start\s+date|starting\s+(?:on|in)|interview\s+process|hiring\s+timeline|interviews?\s+(?:will\s+)?begin|within\s+\d+\s+(?:days|weeks)|\d+[\s\-]*(?:stage|step|round)\s+(?:interview|process))\b"
    ).unwrap();

    // Title and company signals
    pub static ref URGENCY: Regex = Regex::new(
        r"(?i)\b(?:urgent(?:ly)?|immediate(?:ly)?|asap|hiring\s+now|start\s+today|apply\s+now)\b"
    ).unwrap();

    pub static ref STAFFING: Regex = Regex::new(
        r"(?i)\b(?:staffing|recruit(?:ing|ment|ers)|talent\s+(?:solutions|partners|acquisition)|consult(?:ing|ancy|ants)|workforce\s+solutions|placements?|manpower|search\s+partners|headhunt(?:ers|ing))\b"
    ).unwrap();

    pub static ref ANONYMOUS_COMPANY: Regex = Regex::new(
        r"(?i)\b(?:confidential|undisclosed|stealth|anonymous|fortune\s+\d+|our\s+client|a\s+client\s+of\s+ours|privately\s+held\s+company)\b"
    ).unwrap();

    // "Leading Company", "A Global Firm"
    pub static ref GENERIC_COMPANY: Regex = Regex::new(
        r"(?i)^(?:(?:a|an|the|large|leading|growing|fast[\s\-]growing|global|national|international|established|major|top|well[\s\-]known|reputable|innovative|tech|technology|financial|healthcare|private)\s+)*(?:company|firm|employer|organi[sz]ation|business|client|startup|corporation|enterprise)$"
    ).unwrap();

    static ref TECH_TERM_SET: HashSet<&'static str> = TECH_TERMS.iter().copied().collect();
}

/// Technical requirement keywords.
pub const TECH_TERMS: &[&str] = &[
    "rust", "python", "java", "javascript", "typescript", "golang", "c++", "c#", "kotlin",
    "swift", "ruby", "php", "scala", "elixir", "haskell", "sql", "postgresql", "postgres",
    "mysql", "mongodb", "redis", "kafka", "spark", "hadoop", "aws", "gcp", "azure", "docker",
    "kubernetes", "terraform", "ansible", "react", "angular", "vue", "node.js", "django",
    "flask", "rails", "spring", "graphql", "grpc", "linux", "git", "tensorflow", "pytorch",
    "airflow", "snowflake", "dbt", "elasticsearch", "microservices", "excel", "salesforce",
    "tableau", "figma", "autocad", "sap",
];

/// Number of distinct technical terms mentioned in the text.
pub fn count_technical_terms(text: &str) -> usize {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.'))
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| TECH_TERM_SET.contains(token))
        .collect::<HashSet<_>>()
        .len()
}

/// Whether a company name is anonymized or a generic descriptor.
pub fn is_anonymous_company(company: &str) -> bool {
    let company = company.trim();
    company.is_empty() || ANONYMOUS_COMPANY.is_match(company) || GENERIC_COMPANY.is_match(company)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technical_terms() {
        let text = "We use Rust, Python and PostgreSQL on AWS. Rust experience required. Node.js a plus.";
        assert_eq!(count_technical_terms(text), 5);
        assert_eq!(count_technical_terms("Great attitude and teamwork"), 0);
    }

    #[test]
    fn test_company_signals() {
        assert!(STAFFING.is_match("ABC Staffing Solutions"));
        assert!(!STAFFING.is_match("Employer Corp"));
        assert!(is_anonymous_company("Confidential"));
        assert!(is_anonymous_company("Fortune 500 company"));
        assert!(is_anonymous_company("A Leading Global Company"));
        assert!(is_anonymous_company(""));
        assert!(!is_anonymous_company("Employer Corp"));
    }

    #[test]
    fn test_language_cues() {
        assert!(PIPELINE_LANGUAGE.is_match("We are always accepting applications"));
        assert!(PIPELINE_LANGUAGE.is_match("Join our talent community"));
        assert!(COMPENSATION.is_match("Salary range: $120,000 - $150,000"));
        assert!(DEADLINE.is_match("Apply by June 30"));
        assert!(URGENCY.is_match("URGENT: Hiring NOW"));
        assert!(EXCEPTION_TITLE.is_match("Assistant Professor of Biology"));
        assert!(!EXCEPTION_TITLE.is_match("Senior Backend Engineer"));
    }
}
