// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe CSG CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use polyframe_csg::cli::{collect_inputs, plan_jobs, Reporter, Runner};
use polyframe_csg::{parse_script, EngineConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyframe-csg")]
#[command(about = "Polyframe CSG - scripted solid modelling with STL export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./polyframe.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render scripts to binary STL
    Render {
        /// Script files or directories containing .poc scripts
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or output directory when rendering several scripts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Meshing tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Print the SHA-256 of every written file
        #[arg(long)]
        checksum: bool,
    },

    /// Print bounding box, volume and topology of a script's model
    Info {
        input: PathBuf,
    },

    /// Parse a script and output its AST as JSON
    Parse {
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        Reporter::report_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path),
        None => EngineConfig::load(),
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            inputs,
            output,
            tolerance,
            checksum,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(tolerance) = tolerance {
                config.export.tolerance = tolerance;
                config.validate()?;
            }
            render_command(config, &inputs, output.as_deref(), checksum, cli.verbose)
        }
        Commands::Info { input } => {
            let config = load_config(cli.config.as_deref())?;
            let info = Runner::new(config).inspect(&input)?;
            Reporter::report_info(&input, &info);
            Ok(())
        }
        Commands::Parse { input, output } => parse_command(&input, output.as_deref(), cli.verbose),
        Commands::Version => {
            println!("Polyframe CSG v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn render_command(
    config: EngineConfig,
    inputs: &[PathBuf],
    output: Option<&Path>,
    checksum: bool,
    verbose: bool,
) -> Result<()> {
    let start = Instant::now();
    let inputs = collect_inputs(inputs)?;
    if inputs.is_empty() {
        anyhow::bail!("no .poc scripts found");
    }

    let batch = inputs.len() > 1;
    if let (true, Some(dir)) = (batch, output) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let jobs = plan_jobs(inputs, output);

    let progress = if batch && verbose {
        let pb = ProgressBar::new(jobs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .context("invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let runner = Runner::new(config).with_checksum(checksum);
    let results = runner.render_all(&jobs, progress.as_ref());
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let mut failed = 0;
    for (job, result) in &results {
        match result {
            Ok(outcome) => Reporter::report_render(outcome, verbose),
            Err(err) => {
                failed += 1;
                Reporter::report_error(&format!("{}: {err:#}", job.input.display()));
            }
        }
    }

    if batch {
        Reporter::report_summary(results.len() - failed, failed, start.elapsed());
    }
    if failed > 0 {
        anyhow::bail!("{failed} script(s) failed to render");
    }
    Ok(())
}

fn parse_command(input: &Path, output: Option<&Path>, verbose: bool) -> Result<()> {
    if verbose {
        println!("{} {}", "Parsing:".bold(), input.display());
    }

    let source = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let program = parse_script(&source)?;
    let json = serde_json::to_string_pretty(&program)?;

    if let Some(output_path) = output {
        std::fs::write(output_path, json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        if verbose {
            println!("AST written to: {}", output_path.display());
        }
    } else {
        println!("{}", json);
    }

    Ok(())
}
