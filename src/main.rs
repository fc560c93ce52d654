// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use neuro_workflow::utils::logging::{format_error, format_step, format_success, format_warning};
use neuro_workflow::{
    Config, DryRunRunner, LongitudinalOrchestrator, ManifestExporter, MetadataExtractor,
    NiftiScanner, ReconRunner, RunOptions, SubjectOutcome, SubprocessRunner, TableMerger,
    Validator, process_table_file,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "neuro_workflow")]
#[command(version)]
#[command(about = "Metadata, measurement tables and recon-all longitudinal orchestration", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml",
        global = true
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set, global = true)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tabulate acquisition parameters from the JSON sidecars of NIfTI images
    ExtractMetadata {
        /// NIfTI images; each one's folder is searched for a sidecar
        images: Vec<PathBuf>,

        /// Walk a dataset for images instead of (or in addition to) listing them
        #[arg(long, value_name = "DIR")]
        scan: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fail on sidecars missing a required key
        #[arg(long)]
        strict: bool,
    },

    /// Rewrite a stats table so it is keyed by sub, ses and pipeline
    ProcessTable {
        table: PathBuf,

        /// Write here instead of overwriting the input
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Right-join every .csv table in a folder into all_measures.csv next to it
    Merge { folder: PathBuf },

    /// Run the recon-all longitudinal stream for one or more subject directories
    Longitudinal {
        #[arg(required = true, value_name = "SUBJECTS_DIR")]
        subject_dirs: Vec<PathBuf>,

        /// Re-run finished stages and replace reorganized output
        #[arg(long)]
        force: bool,

        /// Print the recon-all commands and planned moves only
        #[arg(long)]
        dry_run: bool,

        #[arg(short = 'j', long, value_name = "NUM")]
        parallel: Option<usize>,

        /// Write a JSON manifest of the run
        #[arg(long, value_name = "FILE")]
        manifest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    neuro_workflow::utils::logging::init_logger(cli.color, cli.verbose);

    let config =
        Config::load_or_default(&cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::ExtractMetadata {
            images,
            scan,
            output,
            strict,
        } => {
            cmd_extract_metadata(&config, images, scan, output, strict)?;
        }
        Commands::ProcessTable { table, output } => {
            cmd_process_table(&config, table, output)?;
        }
        Commands::Merge { folder } => {
            cmd_merge(&config, folder)?;
        }
        Commands::Longitudinal {
            subject_dirs,
            force,
            dry_run,
            parallel,
            manifest,
        } => {
            let options = RunOptions { force, dry_run };
            cmd_longitudinal(config, subject_dirs, options, parallel, manifest, cli.color).await?;
        }
    }

    Ok(())
}

fn cmd_extract_metadata(
    config: &Config,
    mut images: Vec<PathBuf>,
    scan: Option<PathBuf>,
    output: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    if let Some(root) = scan {
        Validator::validate_directory(&root)?;
        let scanner = NiftiScanner::new(config.metadata.scan_pattern.clone());
        images.extend(scanner.scan_directory(&root)?);
    }

    if images.is_empty() {
        warn!("No images given; writing an empty metadata table");
    }

    let output = output.unwrap_or_else(|| PathBuf::from(&config.metadata.output_file));
    Validator::validate_output_parent(&output)?;

    let extractor = MetadataExtractor::new(&config.metadata).with_strict(config.metadata.strict || strict);
    let records = extractor
        .extract_all(&images)
        .context("Metadata extraction failed")?;

    neuro_workflow::extractor::write_records(&output, &records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{}",
        format_success(&format!("{} rows written to {}", records.len(), output.display()))
    );
    Ok(())
}

fn cmd_process_table(config: &Config, table: PathBuf, output: Option<PathBuf>) -> Result<()> {
    Validator::validate_file_path(&table)?;
    if let Some(output) = &output {
        Validator::validate_output_parent(output)?;
    }

    let delimiter = config.tables.delimiter_byte()?;
    let reshaped = process_table_file(&table, output.as_deref(), delimiter)
        .with_context(|| format!("Failed to process {}", table.display()))?;

    println!(
        "{}",
        format_success(&format!(
            "{} rows reshaped in {}",
            reshaped.len(),
            output.as_ref().unwrap_or(&table).display()
        ))
    );
    Ok(())
}

fn cmd_merge(config: &Config, folder: PathBuf) -> Result<()> {
    let merger = TableMerger::new(&config.tables)?;

    match merger.merge_folder(&folder)? {
        Some(summary) => {
            println!(
                "{}",
                format_success(&format!(
                    "{} tables merged into {} ({} rows, {} columns)",
                    summary.files_merged,
                    summary.output.display(),
                    summary.rows,
                    summary.columns
                ))
            );
        }
        None => {
            println!("{}", format_warning("No CSV files found in the specified folder."));
        }
    }

    Ok(())
}

async fn cmd_longitudinal(
    mut config: Config,
    subject_dirs: Vec<PathBuf>,
    options: RunOptions,
    parallel: Option<usize>,
    manifest: Option<PathBuf>,
    color: bool,
) -> Result<()> {
    let start_time = Instant::now();

    if let Some(workers) = parallel {
        config.longitudinal.parallel_workers = workers;
        config.validate()?;
    }

    let exporter = manifest.map(ManifestExporter::new).transpose()?;

    let runner: Arc<dyn ReconRunner> = if options.dry_run {
        Arc::new(DryRunRunner::new(&config.recon))
    } else {
        Arc::new(SubprocessRunner::new(&config.recon))
    };

    let orchestrator = LongitudinalOrchestrator::new(config, runner).with_color(color);
    let report = orchestrator.run(subject_dirs, options).await;

    if let Some(exporter) = exporter {
        exporter.export(&report, true)?;
    }

    let total = report.subjects.len();
    for (idx, subject) in report.subjects.iter().enumerate() {
        let line = match &subject.outcome {
            SubjectOutcome::Completed => format_success(&subject.subject),
            SubjectOutcome::Skipped { reason } => {
                format_warning(&format!("{} skipped: {}", subject.subject, reason))
            }
            SubjectOutcome::Failed { error } => {
                format_error(&format!("{} failed: {}", subject.subject, error))
            }
        };
        println!("{}", format_step(idx + 1, total, &line));
    }

    info!(
        "Longitudinal run finished in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    if report.has_failures() {
        bail!("{} subject(s) failed", report.stats.failed);
    }

    Ok(())
}
