//! Non-interactive `run` subcommand.

use std::path::PathBuf;
use std::str::FromStr as _;
use std::time::Instant;

use case_tracker_case_models::DedupPolicy;
use case_tracker_cli_utils::{IndicatifProgress, MultiProgress};
use case_tracker_pipeline::{Session, Settings, null_progress};

use crate::summary::print_summary;

/// Arguments of `case_tracker run`.
#[derive(clap::Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// PDF documents and CSV/TSV/Excel case lists, in merge order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// JSON rule file (defaults to the built-in rules)
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Minimum amount for the filtered table (e.g. "10000" or "$10,000")
    #[arg(long, value_parser = parse_min_amount)]
    min_amount: Option<f64>,
    /// OCR pages that have no text layer
    #[arg(long)]
    ocr: bool,
    /// Keep every record instead of collapsing duplicate case numbers
    #[arg(long)]
    no_dedupe: bool,
    /// Which duplicate survives: `first_seen` or `last_seen`
    #[arg(long, value_parser = parse_dedup_policy)]
    dedup_policy: Option<DedupPolicy>,
    /// Extract documents one at a time
    #[arg(long)]
    sequential: bool,
    /// Directory for the exported case tables
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Also write a ZIP of the extracted page text to this path
    #[arg(long)]
    archive: Option<PathBuf>,
}

fn parse_min_amount(value: &str) -> Result<f64, String> {
    case_tracker_extract::parse_amount(value).ok_or_else(|| format!("not an amount: {value}"))
}

fn parse_dedup_policy(value: &str) -> Result<DedupPolicy, String> {
    DedupPolicy::from_str(value).map_err(|e| format!("{e}: {value}"))
}

impl RunArgs {
    /// Applies command-line overrides on top of file settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(min) = self.min_amount {
            settings.min_amount = Some(min);
        }
        if self.ocr {
            settings.ocr = true;
        }
        if self.no_dedupe {
            settings.dedupe = false;
        }
        if let Some(policy) = self.dedup_policy {
            settings.dedup_policy = policy;
        }
        if self.sequential {
            settings.parallel_documents = false;
        }
    }
}

/// Runs the pipeline once over `args.inputs` and exports the results.
///
/// # Errors
///
/// Returns an error on unsupported inputs, invalid settings, malformed
/// rules, unreadable spreadsheets, or a failed export. Unreadable PDFs
/// are reported in the summary and do not fail the run.
pub async fn run(
    args: RunArgs,
    mut settings: Settings,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    args.apply(&mut settings);
    settings.validate()?;

    let mut session = Session::new(settings);
    for input in &args.inputs {
        session.add_input(input.clone())?;
    }
    if let Some(path) = &args.rules {
        for diagnostic in session.load_rules(path)? {
            log::warn!("Rule rejected: {diagnostic}");
        }
    }

    let progress = if session.documents.is_empty() {
        null_progress()
    } else {
        IndicatifProgress::documents_bar(multi, "Extracting documents")
    };

    let (inputs, output) = session.execute(&progress).await?;
    print_summary(&output);

    let paths = case_tracker_export::export_all(&args.out_dir, &output)?;
    println!();
    println!("Wrote {}", paths.all.display());
    println!("Wrote {}", paths.filtered.display());

    if let Some(archive) = &args.archive {
        let entries = case_tracker_export::write_text_archive(archive, &inputs.blocks)?;
        println!("Wrote {} ({entries} page text(s))", archive.display());
    }

    log::info!("Finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn flags_override_file_settings() {
        let harness = Harness::parse_from([
            "case_tracker",
            "a.pdf",
            "--min-amount",
            "$10,000",
            "--no-dedupe",
            "--dedup-policy",
            "last_seen",
            "--sequential",
        ]);
        let mut settings = Settings {
            ocr: true,
            ..Settings::default()
        };
        harness.args.apply(&mut settings);

        assert_eq!(settings.min_amount, Some(10_000.0));
        assert!(settings.ocr);
        assert!(!settings.dedupe);
        assert_eq!(settings.dedup_policy, DedupPolicy::LastSeen);
        assert!(!settings.parallel_documents);
    }

    #[test]
    fn rejects_non_numeric_min_amount() {
        assert!(Harness::try_parse_from(["case_tracker", "a.pdf", "--min-amount", "lots"]).is_err());
        assert!(Harness::try_parse_from(["case_tracker"]).is_err());
    }

    #[test]
    fn dedup_policy_flag_accepts_only_known_policies() {
        let harness =
            Harness::parse_from(["case_tracker", "a.pdf", "--dedup-policy", "first_seen"]);
        assert_eq!(harness.args.dedup_policy, Some(DedupPolicy::FirstSeen));

        assert!(
            Harness::try_parse_from(["case_tracker", "a.pdf", "--dedup-policy", "newest"]).is_err()
        );
    }
}
