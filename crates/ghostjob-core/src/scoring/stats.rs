//! Aggregate statistics over scored postings.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::is_placeholder;
use crate::models::platform::Platform;
use crate::models::score::RiskLevel;
use crate::similarity::normalize_company;

/// Companies listed in [`AnalysisStats::top_companies`].
const TOP_COMPANIES: usize = 5;

/// Days covered by [`AnalysisStats::recent_trend`].
const TREND_DAYS: i64 = 7;

/// One scored posting, as kept in analysis history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosting {
    pub company: String,
    pub platform: Platform,
    pub ghost_probability: f32,
    pub risk_level: RiskLevel,
    pub analyzed_at: DateTime<Utc>,
}

/// Per-company summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyStats {
    /// Company name as first seen.
    pub company: String,
    pub average_probability: f32,
    pub total_posts: usize,
    /// Postings classified as high risk.
    pub ghost_posts: usize,
}

/// Analyses on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub count: usize,
    pub average_probability: f32,
}

/// Summary of a set of analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_analyses: usize,
    pub average_probability: f32,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,

    /// Analyses per platform name.
    pub platform_breakdown: BTreeMap<String, usize>,

    /// Companies with the highest mean probability.
    pub top_companies: Vec<CompanyStats>,

    /// Daily counts over the last week, oldest first. Days without
    /// analyses are omitted.
    pub recent_trend: Vec<TrendPoint>,
}

impl AnalysisStats {
    /// Summarize postings relative to the current time.
    pub fn from_scores(scores: &[ScoredPosting]) -> Self {
        Self::from_scores_at(scores, Utc::now())
    }

    /// Summarize postings relative to `now`.
    pub fn from_scores_at(scores: &[ScoredPosting], now: DateTime<Utc>) -> Self {
        if scores.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            total_analyses: scores.len(),
            average_probability: mean(scores.iter().map(|s| s.ghost_probability)),
            ..Default::default()
        };

        for score in scores {
            match score.risk_level {
                RiskLevel::High => stats.high_risk += 1,
                RiskLevel::Medium => stats.medium_risk += 1,
                RiskLevel::Low => stats.low_risk += 1,
            }
            *stats
                .platform_breakdown
                .entry(score.platform.as_str().to_string())
                .or_insert(0) += 1;
        }

        stats.top_companies = top_companies(scores);
        stats.recent_trend = recent_trend(scores, now);
        stats
    }
}

fn top_companies(scores: &[ScoredPosting]) -> Vec<CompanyStats> {
    let mut by_company: HashMap<String, (String, Vec<&ScoredPosting>)> = HashMap::new();
    for score in scores {
        let name = score.company.trim();
        if name.is_empty() || is_placeholder(name) {
            continue;
        }
        by_company
            .entry(normalize_company(name))
            .or_insert_with(|| (name.to_string(), Vec::new()))
            .1
            .push(score);
    }

    let mut companies: Vec<CompanyStats> = by_company
        .into_values()
        .map(|(company, posts)| CompanyStats {
            company,
            average_probability: mean(posts.iter().map(|p| p.ghost_probability)),
            total_posts: posts.len(),
            ghost_posts: posts
                .iter()
                .filter(|p| p.risk_level == RiskLevel::High)
                .count(),
        })
        .collect();

    companies.sort_by(|a, b| {
        b.average_probability
            .total_cmp(&a.average_probability)
            .then_with(|| a.company.cmp(&b.company))
    });
    companies.truncate(TOP_COMPANIES);
    companies
}

fn recent_trend(scores: &[ScoredPosting], now: DateTime<Utc>) -> Vec<TrendPoint> {
    let since = now - Duration::days(TREND_DAYS);
    let mut by_day: BTreeMap<NaiveDate, Vec<f32>> = BTreeMap::new();
    for score in scores.iter().filter(|s| s.analyzed_at > since && s.analyzed_at <= now) {
        by_day
            .entry(score.analyzed_at.date_naive())
            .or_default()
            .push(score.ghost_probability);
    }

    by_day
        .into_iter()
        .map(|(date, values)| TrendPoint {
            date,
            count: values.len(),
            average_probability: mean(values.into_iter()),
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    ((sum / count as f32) * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn posting(company: &str, platform: Platform, p: f32, level: RiskLevel, days_ago: i64) -> ScoredPosting {
        ScoredPosting {
            company: company.to_string(),
            platform,
            ghost_probability: p,
            risk_level: level,
            analyzed_at: now() - Duration::days(days_ago),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(AnalysisStats::from_scores_at(&[], now()), AnalysisStats::default());
    }

    #[test]
    fn test_summary() {
        let scores = vec![
            posting("Acme Inc.", Platform::Linkedin, 0.8, RiskLevel::High, 0),
            posting("ACME", Platform::Indeed, 0.4, RiskLevel::Medium, 1),
            posting("Globex", Platform::Company, 0.1, RiskLevel::Low, 1),
            posting("Unknown Company", Platform::Other, 0.5, RiskLevel::Medium, 20),
        ];

        let stats = AnalysisStats::from_scores_at(&scores, now());

        assert_eq!(stats.total_analyses, 4);
        assert_eq!(stats.average_probability, 0.45);
        assert_eq!((stats.high_risk, stats.medium_risk, stats.low_risk), (1, 2, 1));
        assert_eq!(stats.platform_breakdown.get("linkedin"), Some(&1));
        assert_eq!(stats.platform_breakdown.len(), 4);

        assert_eq!(stats.top_companies.len(), 2);
        assert_eq!(stats.top_companies[0].company, "Acme Inc.");
        assert_eq!(stats.top_companies[0].total_posts, 2);
        assert_eq!(stats.top_companies[0].ghost_posts, 1);
        assert_eq!(stats.top_companies[0].average_probability, 0.6);
        assert_eq!(stats.top_companies[1].company, "Globex");

        let counts: Vec<usize> = stats.recent_trend.iter().map(|t| t.count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(stats.recent_trend[1].date, now().date_naive());
    }
}
