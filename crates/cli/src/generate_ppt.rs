//! Populate a presentation template with the sections of a research summary.

mod common;

use anyhow::{anyhow, Context};
use clap::Parser;
use locker_core::{GeneratePayload, SummarySegmenter};
use locker_pptx::{DeckFiller, Presentation};
use std::path::PathBuf;
use std::process::ExitCode;

use common::{Failure, OrExit};

/// Payload, template, or precondition problems.
const EXIT_INPUT: u8 = 2;
/// The populated deck could not be written.
const EXIT_SAVE: u8 = 3;

/// Fill a .pptx template from a summary payload.
#[derive(Parser, Debug)]
#[command(name = "generate-ppt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON payload with templatePath, outputPath and summary
    payload: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    common::init_logging(args.verbose);

    match run(&args) {
        Ok(output) => {
            println!("OK: saved to {}", output.display());
            ExitCode::SUCCESS
        }
        Err(failure) => failure.report(),
    }
}

fn run(args: &Args) -> Result<PathBuf, Failure> {
    if !args.payload.exists() {
        return Err(Failure::new(
            EXIT_INPUT,
            anyhow!("Payload not found: {}", args.payload.display()),
        ));
    }
    let payload = GeneratePayload::load(&args.payload)
        .with_context(|| format!("Failed to read payload {}", args.payload.display()))
        .or_exit(EXIT_INPUT)?;

    let template = match payload.template_path {
        Some(path) if path.exists() => path,
        Some(path) => {
            return Err(Failure::new(
                EXIT_INPUT,
                anyhow!("Template not found: {}", path.display()),
            ))
        }
        None => {
            return Err(Failure::new(
                EXIT_INPUT,
                anyhow!("Payload has no templatePath"),
            ))
        }
    };
    log::debug!("Template: {}", template.display());

    let sections = SummarySegmenter::canonical()
        .context("Failed to build heading matcher")
        .or_exit(EXIT_INPUT)?
        .segment(&payload.summary);
    for section in &sections {
        log::debug!("{}: {} bullets", section.heading, section.bullets.len());
    }

    let mut presentation = Presentation::open(&template)
        .with_context(|| format!("Failed to open template {}", template.display()))
        .or_exit(EXIT_INPUT)?;

    let report = DeckFiller::new().fill(&mut presentation, &sections);
    log::info!(
        "Filled {} slides, skipped {} headings",
        report.filled.len(),
        report.skipped.len()
    );

    let output = payload
        .output_path
        .ok_or_else(|| anyhow!("Payload has no outputPath"))
        .or_exit(EXIT_SAVE)?;
    presentation
        .save(&output)
        .with_context(|| format!("Failed to save PPTX to {}", output.display()))
        .or_exit(EXIT_SAVE)?;

    Ok(output)
}
