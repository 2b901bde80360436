//! Extract embedded images and table snapshots from a PDF and report them as
//! JSON on stdout.

mod common;

use anyhow::{anyhow, Context};
use clap::Parser;
use locker_core::ExtractionResult;
use locker_pdf::{extract_images, PdfiumLibrary, TableExtractor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use common::{Failure, OrExit};

/// Output is written next to the PDF in this directory.
const OUTPUT_DIR_NAME: &str = "images";

/// PDFium could not be bound, or the output directory or report failed.
const EXIT_FAILURE: u8 = 1;
/// Missing input file.
const EXIT_INPUT: u8 = 2;

/// Extract images and tables from a PDF file.
#[derive(Parser, Debug)]
#[command(name = "pdf-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file
    pdf: PathBuf,

    /// Directory containing the PDFium shared library
    #[arg(long)]
    pdfium_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    common::init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => failure.report(),
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let pdfium = PdfiumLibrary::bind(args.pdfium_dir.as_deref()).or_exit(EXIT_FAILURE)?;

    if !args.pdf.exists() {
        return Err(Failure::new(
            EXIT_INPUT,
            anyhow!("PDF file not found: {}", args.pdf.display()),
        ));
    }
    let pdf = args
        .pdf
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", args.pdf.display()))
        .or_exit(EXIT_INPUT)?;
    let output_dir = ensure_output_dir(&pdf).or_exit(EXIT_FAILURE)?;

    log::info!("Processing PDF: {}", pdf.display());
    log::info!("Output directory: {}", output_dir.display());

    let images = extract_images(&pdf, &output_dir);
    log::info!("Extracted {} images", images.len());

    let tables = match pdfium.open(&pdf) {
        Ok(rasterizer) => TableExtractor::new().extract_tables(&pdf, &output_dir, &rasterizer),
        Err(e) => {
            log::error!("Table extraction failed: {}", e);
            Vec::new()
        }
    };
    log::info!("Extracted {} tables", tables.len());

    let result = extraction_result(&args.pdf, &output_dir, images, tables);
    let json = result.to_json().or_exit(EXIT_FAILURE)?;
    println!("{}", json);

    log::info!(
        "Extraction complete: {} images, {} tables",
        result.total_images,
        result.total_tables
    );
    Ok(())
}

/// Create `<pdf dir>/images` if needed.
fn ensure_output_dir(pdf: &Path) -> anyhow::Result<PathBuf> {
    let parent = pdf
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", pdf.display()))?;
    let output_dir = parent.join(OUTPUT_DIR_NAME);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    Ok(output_dir)
}

/// The report echoes the input path as given; the output directory is absolute.
fn extraction_result(
    input: &Path,
    output_dir: &Path,
    images: Vec<String>,
    tables: Vec<String>,
) -> ExtractionResult {
    ExtractionResult::new(
        input.display().to_string(),
        output_dir.display().to_string(),
        images,
        tables,
        env!("CARGO_PKG_VERSION"),
    )
}
