//! Command-line front end: parse an `.abir` file, run the interval analysis
//! on every function, and print the per-block fixpoint.

mod report;

use std::fs;
use std::path::PathBuf;

use absint_analysis::analyze;
use absint_core::parse_module;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use report::FunctionReport;

#[derive(Parser)]
#[command(author, version, about = "Interval analysis over .abir control-flow graphs")]
struct Cli {
    /// Input file in the .abir text format
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Enable debug-level tracing on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let src = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let module = parse_module(&src)
        .with_context(|| format!("parsing {}", cli.file.display()))?;

    let mut reports = Vec::new();
    let mut failures = 0usize;
    for func in &module.functions {
        match analyze(func) {
            Ok(analysis) => reports.push(FunctionReport::new(func, &analysis)),
            Err(err) => {
                // One broken function should not hide results for the rest.
                error!(function = func.name(), %err, "analysis failed");
                failures += 1;
            }
        }
    }

    match cli.format {
        Format::Text => {
            for report in &reports {
                report.print_text();
            }
        }
        Format::Json => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &reports)?;
            println!();
        }
    }

    if failures > 0 {
        bail!("analysis failed for {failures} function(s)");
    }
    Ok(())
}
