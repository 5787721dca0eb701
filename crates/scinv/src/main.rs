use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scinv_core::{pipeline, ReportConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Unified analysis of a SeisComP inventory XML file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SeisComP inventory XML file
    inventory: PathBuf,

    /// Output directory for results [default: output]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug diagnostics
    #[arg(short, long)]
    debug: bool,

    /// TOML file with report settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_json);

    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    debug!(?config, "resolved report configuration");

    let summary = pipeline::run(&cli.inventory, &config).map_err(|err| {
        let action = if err.is_malformed_input() {
            "not a usable SeisComP inventory"
        } else {
            "failed to analyze inventory"
        };
        anyhow::Error::new(err).context(format!("{action}: {}", cli.inventory.display()))
    })?;

    println!(
        "Found {} sensors ({} referenced by streams)",
        summary.sensors_declared, summary.sensors_referenced
    );
    println!(
        "Found {} dataloggers ({} referenced by streams)",
        summary.dataloggers_declared, summary.dataloggers_referenced
    );
    println!("Found {} responses", summary.responses_declared);
    println!("Found {} total streams", summary.streams);
    if !summary.diagnostics.is_empty() {
        println!(
            "Unresolved references: {} (run with --debug for details)",
            summary.diagnostics.len()
        );
    }
    println!("Output written to {}", summary.output_path.display());

    Ok(())
}

fn init_tracing(debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
