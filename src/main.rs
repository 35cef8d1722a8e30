// Entry point and high-level CLI flow.
//
// One batch run per invocation:
// - load the run configuration (YAML) and the reference tables,
// - extract, validate and assemble the report tables,
// - write the CSV/JSON outputs and print a per-extraction preview.
mod aggregate;
mod assemble;
mod config;
mod error;
mod extract;
mod fanout;
mod fields;
mod loader;
mod lookup;
mod output;
mod pairing;
mod pipeline;
mod plan;
mod table;
mod types;
mod util;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use config::PipelineConfig;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "pipeline.yml";

/// Reconcile grant-project activity worksheets into the ProjectReport table.
#[derive(Parser, Debug)]
#[command(name = "merit-extract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run configuration; `pipeline.yml` is used when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rows of the extraction summary to print
    #[arg(short, long, default_value_t = 20)]
    preview: usize,

    /// Log every extraction
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            PipelineConfig::load(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            log::info!("No {} found, using built-in defaults", DEFAULT_CONFIG);
            PipelineConfig::default()
        }
    };
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = load_config(&cli)?;
    let output = pipeline::run(&config).context("Extraction run failed")?;
    output::write_outputs(&output, &config.output_dir)?;

    let summary = &output.summary;
    output::preview_table_rows("Extraction summary", &summary.extractions, cli.preview);
    println!(
        "{} report rows, {} project attribute rows, {} rejected line items ({} degenerate rows dropped)",
        util::format_int(summary.report_rows),
        util::format_int(summary.project_attribute_rows),
        util::format_int(summary.rejected_records),
        util::format_int(summary.degenerate_rows_dropped)
    );
    println!("(Full tables exported to {})\n", config.output_dir.display());
    Ok(())
}
