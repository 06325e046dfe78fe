//! Score command - score manually entered job data.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;

use ghostjob_core::extraction::parse_posted_date;
use ghostjob_core::models::score::{JobData, RiskLevel, ScoreResult};
use ghostjob_core::scoring::ScoringEngine;

use super::config::load_config;

/// Arguments for the score command.
#[derive(Args)]
pub struct ScoreArgs {
    /// Job title
    #[arg(long)]
    title: Option<String>,

    /// Company name
    #[arg(long)]
    company: Option<String>,

    /// Job description
    #[arg(long)]
    description: Option<String>,

    /// Location
    #[arg(long)]
    location: Option<String>,

    /// URL the posting was found at
    #[arg(long)]
    url: Option<String>,

    /// Other URLs carrying the same posting
    #[arg(long = "mirror")]
    mirrors: Vec<String>,

    /// JSON job data file ("-" for stdin) instead of the field flags
    #[arg(long, conflicts_with_all = ["title", "company", "description", "location", "url", "mirrors"])]
    input: Option<PathBuf>,

    /// Posting date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    posted_at: Option<String>,

    /// Print JSON instead of a summary
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ScoreArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let engine = ScoringEngine::new().with_config(config.scoring);

    let posted_at = args
        .posted_at
        .as_deref()
        .map(|value| {
            parse_posted_date(value)
                .ok_or_else(|| anyhow::anyhow!("Invalid posting date: {}", value))
        })
        .transpose()?;

    let result = match &args.input {
        Some(path) => {
            let json = if path.as_os_str() == "-" {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            } else {
                fs::read_to_string(path)?
            };
            engine.score_json(&json, posted_at)?
        }
        None => {
            let mut job = JobData::new(
                args.title.clone().unwrap_or_default(),
                args.company.clone().unwrap_or_default(),
                args.description.clone().unwrap_or_default(),
            );
            job.location = args.location.clone();
            job.url = args.url.clone();
            job.mirror_urls = args.mirrors.clone();
            engine.score(&job, posted_at)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_score(&result);
    }

    Ok(())
}

fn print_score(result: &ScoreResult) {
    let level = match result.risk_level {
        RiskLevel::High => style(result.risk_level.as_str().to_uppercase()).red(),
        RiskLevel::Medium => style(result.risk_level.as_str().to_uppercase()).yellow(),
        RiskLevel::Low => style(result.risk_level.as_str().to_uppercase()).green(),
    };

    println!(
        "Ghost probability: {:.3} ({} risk, confidence {:.2})",
        result.ghost_probability, level, result.confidence
    );

    if !result.risk_factors.is_empty() {
        println!();
        println!("{}", style("Risk factors:").red());
        for factor in &result.risk_factors {
            println!("  +{:.2}  {}", factor.weight, factor.rationale);
        }
    }

    if !result.key_factors.is_empty() {
        println!();
        println!("{}", style("Positive signals:").green());
        for factor in &result.key_factors {
            println!("  {:+.3}  {}", factor.weight, factor.rationale);
        }
    }

    if result.positive_adjustment_applied {
        println!();
        println!("{} Positive adjustment applied", style("ℹ").blue());
    }
    println!("{} Algorithm {}", style("ℹ").blue(), result.algorithm_version);
}
