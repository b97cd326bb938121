//! CLI tool for assembling a PPTX slide deck from HTML fragments.

use anyhow::{Context, Result};
use clap::Parser;
use deck_core::config::DEFAULT_CONFIG_FILE;
use deck_core::{BuildConfig, BuildObserver, BuildReport, Orchestrator};
use deck_html::HtmlConverter;
use deck_pptx::PptxWriter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Build a PowerPoint deck from an ordered list of HTML slides.
///
/// With no arguments, builds `deck.json` from the current directory if it
/// exists, otherwise the built-in deck.
#[derive(Parser, Debug)]
#[command(name = "deck-build")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON build configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file (overrides the configured path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Prints build progress to stdout.
struct ConsoleProgress;

impl BuildObserver for ConsoleProgress {
    fn slide_started(&mut self, index: usize, total: usize, name: &str) {
        println!("Converting slide {}/{}: {}...", index + 1, total, name);
    }

    fn finished(&mut self, report: &BuildReport) {
        println!();
        println!("Presentation created successfully: {}", report.output.display());
        println!("Total slides: {}", report.slide_count);
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<BuildReport> {
    let config = load_config(args)?;
    log::debug!(
        "Building {} slides from {} into {}",
        config.slides.len(),
        config.slides_dir.display(),
        config.output.display()
    );

    let mut orchestrator = Orchestrator::new(config, HtmlConverter::new(), PptxWriter::new());
    Ok(orchestrator.run(&mut ConsoleProgress)?)
}

/// Resolve the configuration: explicit file, `deck.json`, or the built-in deck.
fn load_config(args: &Args) -> Result<BuildConfig> {
    let config = match &args.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("Failed to determine working directory")?;
            let default_file = cwd.join(DEFAULT_CONFIG_FILE);
            if default_file.is_file() {
                BuildConfig::load(&default_file)
                    .with_context(|| format!("Failed to load {}", default_file.display()))?
            } else {
                log::debug!("No {} found, using built-in deck", DEFAULT_CONFIG_FILE);
                BuildConfig::builtin(&cwd)
            }
        }
    };

    Ok(match &args.output {
        Some(output) => config.with_output(output),
        None => config,
    })
}
