//! Corrections command - manage learned extraction corrections.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Subcommand};
use console::style;
use uuid::Uuid;

use ghostjob_core::learning::{CorrectionLearningService, JsonFileCorrectionStore};
use ghostjob_core::models::correction::{Correction, CorrectionPattern, normalize_host};
use ghostjob_core::models::job::JobField;

use super::config::load_config;

/// Arguments for the corrections command.
#[derive(Args)]
pub struct CorrectionsArgs {
    /// Correction store file (default: configured store, else the data directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: CorrectionsCommand,
}

#[derive(Subcommand)]
enum CorrectionsCommand {
    /// Record a correction
    Add(AddArgs),

    /// List stored corrections
    List {
        /// Only corrections stored under this domain
        #[arg(long)]
        key: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the verified flag of a correction
    Unverify {
        /// Domain the correction is stored under
        key: String,
        /// Correction id
        id: Uuid,
    },
}

#[derive(Args)]
struct AddArgs {
    /// Domain the correction applies to (subdomains included)
    #[arg(long, required_unless_present = "url_pattern", conflicts_with = "url_pattern")]
    domain: Option<String>,

    /// URL pattern the correction applies to ("*" matches anything)
    #[arg(long)]
    url_pattern: Option<String>,

    /// Field to correct (title, company, location, description)
    #[arg(long)]
    field: JobField,

    /// Corrected value
    #[arg(long)]
    value: String,

    /// Value the parser produced (default: replace any value)
    #[arg(long)]
    original: Option<String>,

    /// Restrict to one parser
    #[arg(long)]
    parser: Option<String>,

    /// Confidence of the correction
    #[arg(long, default_value = "0.9")]
    confidence: f32,

    /// Mark as verified
    #[arg(long)]
    verified: bool,
}

pub async fn run(args: CorrectionsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let path = args
        .store
        .or(config.learning.store_path.clone())
        .unwrap_or_else(default_store_path);

    let store = JsonFileCorrectionStore::open(&path)?;
    let service =
        CorrectionLearningService::new(Arc::new(store)).with_config(config.learning.clone());

    match args.command {
        CorrectionsCommand::Add(add) => add_correction(&service, add),
        CorrectionsCommand::List { key, json } => list_corrections(&service, key.as_deref(), json),
        CorrectionsCommand::Unverify { key, id } => {
            let correction = service.mark_unverified(&normalize_host(&key), id)?;
            println!(
                "{} Correction {} marked unverified",
                style("✓").green(),
                correction.id
            );
            Ok(())
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ghostjob")
        .join("corrections.json")
}

fn add_correction(service: &CorrectionLearningService, args: AddArgs) -> anyhow::Result<()> {
    let pattern = match (args.domain, args.url_pattern) {
        (Some(domain), _) => CorrectionPattern::Domain(domain),
        (None, Some(pattern)) => CorrectionPattern::UrlPattern(pattern),
        (None, None) => anyhow::bail!("Either --domain or --url-pattern is required"),
    };

    let mut correction = Correction::new(
        pattern,
        args.field,
        args.original,
        args.value,
        args.confidence,
    );
    if let Some(parser) = args.parser {
        correction = correction.for_parser(parser);
    }
    if args.verified {
        correction = correction.verified();
    }

    let stored = service.record_correction(correction)?;
    println!(
        "{} Recorded correction {} ({} -> '{}', {})",
        style("✓").green(),
        stored.id,
        stored.field,
        stored.corrected_value,
        stored.pattern.describe()
    );

    Ok(())
}

fn list_corrections(
    service: &CorrectionLearningService,
    key: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let corrections = service.list_corrections(key)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&corrections)?);
        return Ok(());
    }

    if corrections.is_empty() {
        println!("{} No corrections stored.", style("ℹ").blue());
        return Ok(());
    }

    for correction in &corrections {
        let status = if correction.verified {
            style("verified").green()
        } else {
            style("unverified").yellow()
        };
        println!(
            "{}  {:<11} {:<12} '{}' -> '{}' ({:.2}, {}){}",
            correction.id,
            correction.storage_key(),
            correction.field.as_str(),
            correction.original_value.as_deref().unwrap_or("*"),
            correction.corrected_value,
            correction.confidence,
            status,
            correction
                .parser
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default()
        );
    }

    Ok(())
}
