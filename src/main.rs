//! medscrub - OCR and PII redaction for scanned medical documents
//!
//! Batch tool: for every image in the input directory it extracts text
//! with Tesseract, detects PII in the recognized words, blacks out the
//! matching image regions, and writes the extracted text, a PII report,
//! and the redacted image next to each other in the output directory.

mod config;
mod error;
mod ocr;
mod pii;
mod pipeline;
mod redact;
mod report;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::ocr::TesseractExtractor;
use crate::pii::{PiiCategory, PiiDetector};

/// medscrub - redact PII from scanned medical documents
#[derive(Parser, Debug)]
#[command(name = "medscrub")]
#[command(about = "OCR scanned medical documents and redact PII before output")]
struct Args {
    /// Directory of input images (.jpg/.jpeg/.png), read non-recursively
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the output artifacts (created if absent)
    #[arg(short, long)]
    output: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum OCR confidence for PII matching (0.0 - 1.0, 0 disables)
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Disable a PII category (repeatable), e.g. --disable date
    #[arg(long, value_name = "CATEGORY")]
    disable: Vec<String>,

    /// Tesseract language code
    #[arg(long)]
    lang: Option<String>,

    /// JPEG quality of the redacted image (1 - 100)
    #[arg(long)]
    jpeg_quality: Option<u8>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = build_config(&args)?;

    if !args.input.is_dir() {
        return Err(PipelineError::Configuration(format!(
            "input directory {:?} does not exist or is not a directory",
            args.input
        ))
        .into());
    }

    info!("medscrub starting");

    // One Tesseract instance for the whole batch.
    let mut extractor = TesseractExtractor::new(&config.ocr)?;
    let detector = PiiDetector::new(&config.detection);

    let summary = pipeline::run(
        &args.input,
        &args.output,
        &mut extractor,
        &detector,
        &config.output,
    )?;

    println!(
        "Done: {} processed, {} skipped, {} failed. Outputs in {:?}",
        summary.processed, summary.skipped, summary.failed, args.output
    );

    // Per-file failures do not change the exit code; only fatal
    // configuration errors above return non-zero.
    Ok(())
}

/// Load the config file (if any) and apply CLI overrides.
fn build_config(args: &Args) -> Result<AppConfig, PipelineError> {
    let mut config = match &args.config {
        Some(path) => config::load_config(path).map_err(|e| {
            PipelineError::Configuration(format!("failed to load config {path:?}: {e}"))
        })?,
        None => AppConfig::default(),
    };

    if let Some(value) = args.min_confidence {
        if !(0.0..=1.0).contains(&value) {
            return Err(PipelineError::Configuration(format!(
                "min confidence must be within 0.0 - 1.0, got {value}"
            )));
        }
        config.detection.min_confidence = value;
    }

    if let Some(lang) = &args.lang {
        config.ocr.language = lang.clone();
    }

    if let Some(quality) = args.jpeg_quality {
        if !(1..=100).contains(&quality) {
            return Err(PipelineError::Configuration(format!(
                "JPEG quality must be within 1 - 100, got {quality}"
            )));
        }
        config.output.jpeg_quality = quality;
    }

    for name in &args.disable {
        let category: PiiCategory = name.parse().map_err(PipelineError::Configuration)?;
        if !config.detection.disabled_categories.contains(&category) {
            config.detection.disabled_categories.push(category);
        }
    }

    Ok(config)
}
