//! Error taxonomy for the redaction pipeline.
//!
//! Per-file errors (`ImageLoad`, `OcrEngine`, `IoWrite`) are isolated by the
//! orchestrator: the file is counted as failed and the batch continues.
//! `Configuration` errors are fatal and abort before any file is processed.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input file could not be decoded as an image.
    #[error("failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The OCR engine failed to initialize or to process an image.
    #[error("OCR engine error: {0}")]
    OcrEngine(String),

    /// An output artifact could not be written.
    #[error("failed to write {path:?}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid startup configuration (bad paths, unknown category names).
    #[error("configuration error: {0}")]
    Configuration(String),
}
