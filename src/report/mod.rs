//! Output artifacts.
//!
//! Persists the three files produced for each successfully processed
//! document: the extracted text, the PII report, and the redacted JPEG.
//! Files are keyed by the input filename's stem.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::PipelineError;
use crate::ocr::Detection;
use crate::pii::PiiMatch;

/// Everything produced for one input image.
pub struct DocumentResult {
    pub source_image_path: PathBuf,
    /// Detections in extractor order
    pub detections: Vec<Detection>,
    pub pii_matches: Vec<PiiMatch>,
    pub redacted_image: RgbImage,
}

/// Paths of the three written artifacts.
#[derive(Debug)]
pub struct ReportPaths {
    pub text_path: PathBuf,
    pub pii_path: PathBuf,
    pub image_path: PathBuf,
}

/// Write `<stem>_text.txt`, `<stem>_pii.txt` and `<stem>_redacted.jpg`
/// into `output_dir`, creating the directory if needed.
pub fn write(
    result: &DocumentResult,
    output_dir: &Path,
    jpeg_quality: u8,
) -> Result<ReportPaths, PipelineError> {
    std::fs::create_dir_all(output_dir).map_err(|e| PipelineError::IoWrite {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let stem = result
        .source_image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let paths = ReportPaths {
        text_path: output_dir.join(format!("{stem}_text.txt")),
        pii_path: output_dir.join(format!("{stem}_pii.txt")),
        image_path: output_dir.join(format!("{stem}_redacted.jpg")),
    };

    write_text(&paths.text_path, &result.detections)?;
    write_pii(&paths.pii_path, &result.pii_matches)?;
    write_image(&paths.image_path, &result.redacted_image, jpeg_quality)?;

    debug!(
        "wrote artifacts for {:?}: {} text lines, {} PII matches",
        result.source_image_path,
        result.detections.len(),
        result.pii_matches.len()
    );
    Ok(paths)
}

fn io_write(path: &Path, e: std::io::Error) -> PipelineError {
    PipelineError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    }
}

/// One detection's text per line, in extractor order.
fn write_text(path: &Path, detections: &[Detection]) -> Result<(), PipelineError> {
    let mut out = String::new();
    for detection in detections {
        out.push_str(&detection.text);
        out.push('\n');
    }
    std::fs::write(path, out).map_err(|e| io_write(path, e))
}

/// One `<category>: <matched_text>` line per match, in detector order.
fn write_pii(path: &Path, matches: &[PiiMatch]) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    for pii in matches {
        writeln!(writer, "{}: {}", pii.category, pii.matched_text).map_err(|e| io_write(path, e))?;
    }
    writer.flush().map_err(|e| io_write(path, e))
}

fn write_image(path: &Path, image: &RgbImage, quality: u8) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| io_write(path, std::io::Error::other(e)))
}
