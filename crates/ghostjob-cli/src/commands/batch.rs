//! Batch command - analyze postings listed in a manifest.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};
use uuid::Uuid;

use ghostjob_core::analysis::{GhostJobAnalyzer, JobAnalysis};
use ghostjob_core::dedup::DuplicateGroup;
use ghostjob_core::extraction::parse_posted_date;
use ghostjob_core::scoring::AnalysisStats;

use super::analyze::{OutputFormat, analyze_with, format_analysis};
use super::config::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Manifest: JSON array of {"file", "url"?, "posted_at"?}; "file" may be a glob
    #[arg(required = true)]
    manifest: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each posting
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV and statistics
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Correction store to apply (overrides the configured one)
    #[arg(long)]
    corrections: Option<PathBuf>,
}

/// One manifest entry.
#[derive(Debug, Deserialize)]
struct ManifestEntry {
    file: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    posted_at: Option<String>,
}

/// A posting file to analyze.
struct BatchJob {
    path: PathBuf,
    url: Option<String>,
    posted_at: Option<DateTime<Utc>>,
}

/// Result of analyzing a single file.
struct BatchResult {
    path: PathBuf,
    analysis: Option<JobAnalysis>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(path) = &args.corrections {
        config.learning.store_path = Some(path.clone());
    }
    let analyzer = Arc::new(GhostJobAnalyzer::from_config(&config)?);

    let jobs = read_manifest(&args.manifest)?;
    if jobs.is_empty() {
        anyhow::bail!("No posting files found in manifest: {}", args.manifest.display());
    }

    println!(
        "{} Found {} postings to analyze",
        style("ℹ").blue(),
        jobs.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(jobs.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} postings")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut handles = Vec::with_capacity(jobs.len());

    for job in jobs {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let analyzer = Arc::clone(&analyzer);
        let pb = overall_pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = fs::read(&job.path)
                .map_err(anyhow::Error::from)
                .and_then(|data| {
                    analyze_with(&analyzer, &data, job.url.as_deref(), job.posted_at, &[])
                });
            pb.inc(1);

            let processing_time_ms = file_start.elapsed().as_millis() as u64;
            match result {
                Ok(analysis) => BatchResult {
                    path: job.path,
                    analysis: Some(analysis),
                    error: None,
                    processing_time_ms,
                },
                Err(e) => BatchResult {
                    path: job.path,
                    analysis: None,
                    error: Some(e.to_string()),
                    processing_time_ms,
                },
            }
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;
        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to analyze {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to analyze {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Analysis failed for {}: {}", result.path.display(), error_msg);
            }
        }
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<&BatchResult> = results.iter().filter(|r| r.analysis.is_some()).collect();
    let failed: Vec<&BatchResult> = results.iter().filter(|r| r.error.is_some()).collect();

    let records: Vec<_> = successful
        .iter()
        .filter_map(|r| r.analysis.as_ref())
        .map(|a| a.record.clone())
        .collect();
    let groups = analyzer.detector().cluster(&records);
    let group_of: HashMap<Uuid, Uuid> = groups
        .iter()
        .flat_map(|g| g.members.iter().map(move |m| (m.id, g.id)))
        .collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            if let Some(analysis) = &result.analysis {
                let output_name = result
                    .path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("posting");
                let output_path =
                    output_dir.join(format!("{}.{}", output_name, args.format.extension()));
                fs::write(&output_path, format_analysis(analysis, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }

        if !groups.is_empty() {
            let groups_path = output_dir.join("duplicates.json");
            fs::write(&groups_path, serde_json::to_string_pretty(&groups)?)?;
            debug!("Wrote {} duplicate groups to {}", groups.len(), groups_path.display());
        }
    }

    if args.summary {
        let base = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let summary_path = base.join("summary.csv");
        write_summary(&summary_path, &results, &group_of)?;

        let scored: Vec<_> = successful
            .iter()
            .filter_map(|r| r.analysis.as_ref())
            .filter_map(JobAnalysis::to_scored_posting)
            .collect();
        let stats = AnalysisStats::from_scores(&scored);
        let stats_path = base.join("stats.json");
        fs::write(&stats_path, serde_json::to_string_pretty(&stats)?)?;

        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
        print_stats(&stats);
    }

    println!();
    println!(
        "{} Analyzed {} postings in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} duplicate groups",
        style(successful.len()).green(),
        style(failed.len()).red(),
        style(groups.len()).yellow()
    );

    print_groups(&groups, &results);

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed postings:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn read_manifest(path: &Path) -> anyhow::Result<Vec<BatchJob>> {
    if !path.exists() {
        anyhow::bail!("Manifest not found: {}", path.display());
    }

    let content = fs::read_to_string(path)?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid manifest {}: {}", path.display(), e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut jobs = Vec::new();
    for entry in entries {
        let posted_at = entry
            .posted_at
            .as_deref()
            .map(|value| {
                parse_posted_date(value)
                    .ok_or_else(|| anyhow::anyhow!("Invalid posting date in manifest: {}", value))
            })
            .transpose()?;

        let pattern = base.join(&entry.file);
        let pattern = pattern
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Non UTF-8 path in manifest: {}", entry.file))?;

        let files: Vec<PathBuf> = glob(pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if files.is_empty() {
            anyhow::bail!("No files match manifest entry: {}", entry.file);
        }

        for file in files {
            jobs.push(BatchJob {
                path: file,
                url: entry.url.clone(),
                posted_at,
            });
        }
    }

    Ok(jobs)
}

fn write_summary(
    path: &Path,
    results: &[BatchResult],
    group_of: &HashMap<Uuid, Uuid>,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "title",
        "company",
        "platform",
        "canonical_url",
        "extraction_confidence",
        "low_confidence",
        "ghost_probability",
        "risk_level",
        "duplicate_group",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(analysis) = &result.analysis {
            let record = &analysis.record;
            wtr.write_record([
                filename,
                "success",
                record.title(),
                record.company(),
                record.platform.as_str(),
                &record.canonical_url,
                &format!("{:.2}", record.confidence),
                &record.metadata.low_confidence.to_string(),
                &analysis
                    .score
                    .as_ref()
                    .map(|s| format!("{:.3}", s.ghost_probability))
                    .unwrap_or_default(),
                analysis.score.as_ref().map(|s| s.risk_level.as_str()).unwrap_or(""),
                &group_of
                    .get(&record.id)
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                &result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn print_stats(stats: &AnalysisStats) {
    println!();
    println!(
        "Mean ghost probability: {:.3} over {} scored postings",
        stats.average_probability, stats.total_analyses
    );
    println!(
        "   {} high, {} medium, {} low",
        style(stats.high_risk).red(),
        style(stats.medium_risk).yellow(),
        style(stats.low_risk).green()
    );
    for company in &stats.top_companies {
        println!(
            "   {:<30} {:.3} ({} postings)",
            company.company, company.average_probability, company.total_posts
        );
    }
}

fn print_groups(groups: &[DuplicateGroup], results: &[BatchResult]) {
    if groups.is_empty() {
        return;
    }

    let names: HashMap<Uuid, String> = results
        .iter()
        .filter_map(|r| {
            r.analysis
                .as_ref()
                .map(|a| (a.record.id, r.path.display().to_string()))
        })
        .collect();

    println!();
    println!("{}", style("Duplicate groups:").yellow());
    for group in groups {
        let canonical = names
            .get(&group.canonical_id)
            .cloned()
            .unwrap_or_else(|| group.canonical_id.to_string());
        println!("  {} (canonical: {})", group.id, canonical);
        for member in &group.members {
            if member.id != group.canonical_id {
                println!(
                    "    - {}",
                    names.get(&member.id).map(String::as_str).unwrap_or("?")
                );
            }
        }
    }
}
