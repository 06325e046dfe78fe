//! Analyze command - extract, deduplicate and score a single posting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use ghostjob_core::analysis::{AnalysisRequest, Disposition, GhostJobAnalyzer, JobAnalysis};
use ghostjob_core::document::DocumentExtractor;
use ghostjob_core::extraction::parse_posted_date;
use ghostjob_core::models::config::GhostJobConfig;
use ghostjob_core::models::job::{JobField, NormalizedJobRecord};

use super::config::load_config;

/// Arguments for the analyze command.
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input file (HTML, plain text or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// URL the posting was fetched from
    #[arg(short, long)]
    url: Option<String>,

    /// Posting date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    posted_at: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// JSON array of previously analyzed records to check for duplicates
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Correction store to apply (overrides the configured one)
    #[arg(long)]
    corrections: Option<PathBuf>,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: AnalyzeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(path) = &args.corrections {
        config.learning.store_path = Some(path.clone());
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let posted_at = args
        .posted_at
        .as_deref()
        .map(|value| {
            parse_posted_date(value)
                .ok_or_else(|| anyhow::anyhow!("Invalid posting date: {}", value))
        })
        .transpose()?;

    let candidates = match &args.candidates {
        Some(path) => load_candidates(path)?,
        None => Vec::new(),
    };

    info!("Analyzing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Reading document...");
    pb.set_position(10);
    let data = fs::read(&args.input)?;

    pb.set_message("Analyzing posting...");
    pb.set_position(40);
    let analysis = analyze_bytes(&data, args.url.as_deref(), posted_at, &config, &candidates)?;

    pb.finish_and_clear();

    let output = format_analysis(&analysis, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !analysis.notes.is_empty() {
        eprintln!("{}", style("Notes:").yellow());
        for note in &analysis.notes {
            eprintln!("  - {}", note);
        }
    }

    if args.show_confidence {
        print_confidence(&analysis.record);
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            analysis.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the pipeline over document bytes.
pub fn analyze_bytes(
    data: &[u8],
    url: Option<&str>,
    posted_at: Option<chrono::DateTime<chrono::Utc>>,
    config: &GhostJobConfig,
    candidates: &[NormalizedJobRecord],
) -> anyhow::Result<JobAnalysis> {
    let analyzer = GhostJobAnalyzer::from_config(config)?;
    analyze_with(&analyzer, data, url, posted_at, candidates)
}

/// Run the pipeline over document bytes with an existing analyzer.
pub fn analyze_with(
    analyzer: &GhostJobAnalyzer,
    data: &[u8],
    url: Option<&str>,
    posted_at: Option<chrono::DateTime<chrono::Utc>>,
    candidates: &[NormalizedJobRecord],
) -> anyhow::Result<JobAnalysis> {
    let raw = DocumentExtractor::new().extract(data, url)?;
    let mut request = AnalysisRequest::new(raw);
    if let Some(posted_at) = posted_at {
        request = request.with_posted_at(posted_at);
    }
    Ok(analyzer.analyze(&request, candidates)?)
}

fn load_candidates(path: &Path) -> anyhow::Result<Vec<NormalizedJobRecord>> {
    let content = fs::read_to_string(path)?;
    let records: Vec<NormalizedJobRecord> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid candidates file {}: {}", path.display(), e))?;
    debug!("Loaded {} candidate records", records.len());
    Ok(records)
}

fn print_confidence(record: &NormalizedJobRecord) {
    eprintln!();
    eprintln!(
        "{} Extraction confidence: {:.1}% ({} via {:?})",
        style("ℹ").blue(),
        record.confidence * 100.0,
        record.metadata.parser_name,
        record.metadata.strategy
    );
    for field in JobField::ALL {
        let value = record.fields.get(field);
        eprintln!(
            "   {:<12} {:>5.1}%  {:?}",
            field.as_str(),
            value.confidence * 100.0,
            value.source
        );
    }
}

/// Render an analysis in the requested format.
pub fn format_analysis(analysis: &JobAnalysis, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
        OutputFormat::Csv => format_analysis_csv(analysis),
        OutputFormat::Text => Ok(format_analysis_text(analysis)),
    }
}

fn format_analysis_csv(analysis: &JobAnalysis) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "title",
        "company",
        "location",
        "platform",
        "source_url",
        "canonical_url",
        "confidence",
        "low_confidence",
        "ghost_probability",
        "risk_level",
        "disposition",
    ])?;

    let record = &analysis.record;
    wtr.write_record([
        record.title(),
        record.company(),
        record.location().unwrap_or(""),
        record.platform.as_str(),
        &record.source_url,
        &record.canonical_url,
        &format!("{:.2}", record.confidence),
        &record.metadata.low_confidence.to_string(),
        &analysis
            .score
            .as_ref()
            .map(|s| format!("{:.3}", s.ghost_probability))
            .unwrap_or_default(),
        analysis.score.as_ref().map(|s| s.risk_level.as_str()).unwrap_or(""),
        &disposition_label(&analysis.disposition),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_analysis_text(analysis: &JobAnalysis) -> String {
    let record = &analysis.record;
    let mut output = String::new();

    output.push_str(&format!("Title: {}\n", record.title()));
    output.push_str(&format!("Company: {}\n", record.company()));
    if let Some(location) = record.location() {
        output.push_str(&format!("Location: {}\n", location));
    }
    output.push_str(&format!("Platform: {}\n", record.platform));
    if !record.canonical_url.is_empty() {
        output.push_str(&format!("URL: {}\n", record.canonical_url));
    }
    output.push('\n');

    match &analysis.score {
        Some(score) => {
            output.push_str(&format!(
                "Ghost probability: {:.0}% ({} risk, confidence {:.0}%)\n",
                score.ghost_probability * 100.0,
                score.risk_level,
                score.confidence * 100.0
            ));
            if !score.risk_factors.is_empty() {
                output.push_str("\nRisk factors:\n");
                for factor in &score.risk_factors {
                    output.push_str(&format!("  +{:.2}  {}\n", factor.weight, factor.rationale));
                }
            }
            if !score.key_factors.is_empty() {
                output.push_str("\nPositive signals:\n");
                for factor in &score.key_factors {
                    output.push_str(&format!("  {:+.3}  {}\n", factor.weight, factor.rationale));
                }
            }
        }
        None => output.push_str("Ghost probability: not scored\n"),
    }

    if !analysis.duplicates.is_empty() {
        output.push_str(&format!(
            "\nDuplicates: {} ({})\n",
            analysis.duplicates.len(),
            disposition_label(&analysis.disposition)
        ));
        for found in &analysis.duplicates {
            output.push_str(&format!(
                "  {} {} ({:.2})\n",
                found.candidate_id, found.method, found.confidence
            ));
        }
    }

    output
}

fn disposition_label(disposition: &Disposition) -> String {
    match disposition {
        Disposition::StoreAsNew => "store_as_new".to_string(),
        Disposition::MergeInto(id) => format!("merge_into:{}", id),
    }
}
