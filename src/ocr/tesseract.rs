//! Tesseract OCR backend.
//!
//! Drives Tesseract through leptess and parses its TSV output into
//! word-level [`Detection`]s. Tesseract is treated as a black box: text,
//! boxes and confidences are passed through unmodified apart from scaling
//! confidence to 0.0 - 1.0.

use image::{DynamicImage, GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use std::io::Cursor;
use tracing::debug;

use super::{preprocess, Detection, TextExtractor};
use crate::config::OcrConfig;
use crate::error::PipelineError;

/// Tesseract TSV row level for individual words.
const TSV_WORD_LEVEL: &str = "5";

/// Word-level text extractor backed by a single Tesseract instance.
pub struct TesseractExtractor {
    engine: LepTess,
    preprocessing: bool,
    dpi: i32,
}

impl TesseractExtractor {
    /// Initialize Tesseract for the configured language and page
    /// segmentation mode. Fails if the language data is not installed.
    pub fn new(config: &OcrConfig) -> Result<Self, PipelineError> {
        let mut engine = LepTess::new(None, &config.language).map_err(|e| {
            PipelineError::OcrEngine(format!(
                "failed to initialize Tesseract for language '{}': {e}",
                config.language
            ))
        })?;

        engine
            .set_variable(Variable::TesseditPagesegMode, &config.psm.to_string())
            .map_err(|e| {
                PipelineError::OcrEngine(format!("failed to set page segmentation mode: {e}"))
            })?;

        Ok(Self {
            engine,
            preprocessing: config.preprocessing,
            dpi: config.dpi as i32,
        })
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, PipelineError> {
        // leptess reads image data from an encoded buffer, so the decoded
        // image goes back through an in-memory PNG.
        let png = if self.preprocessing {
            encode_gray_png(&preprocess::prepare_for_ocr(image))?
        } else {
            encode_png(image)?
        };

        self.engine
            .set_image_from_mem(&png)
            .map_err(|e| PipelineError::OcrEngine(format!("failed to load image: {e}")))?;
        self.engine.set_source_resolution(self.dpi);

        let tsv = self
            .engine
            .get_tsv_text(0)
            .map_err(|e| PipelineError::OcrEngine(format!("failed to read OCR output: {e}")))?;

        let detections = parse_tsv(&tsv);
        debug!("Tesseract returned {} word detections", detections.len());
        Ok(detections)
    }
}

fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PipelineError::OcrEngine(format!("failed to encode image for OCR: {e}")))?;
    Ok(buf)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, PipelineError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| PipelineError::OcrEngine(format!("failed to encode image for OCR: {e}")))?;
    Ok(buf)
}

/// Parse Tesseract TSV output into word detections.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text. Only word rows (level 5) with a
/// non-negative confidence and non-empty text survive; structural rows
/// (pages, blocks, lines) carry conf -1 and no text. Malformed rows are
/// skipped rather than failing the whole image.
fn parse_tsv(tsv: &str) -> Vec<Detection> {
    let mut detections = Vec::new();

    for line in tsv.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != 12 || cols[0] != TSV_WORD_LEVEL {
            continue;
        }

        let (Ok(left), Ok(top), Ok(width), Ok(height)) = (
            cols[6].parse::<u32>(),
            cols[7].parse::<u32>(),
            cols[8].parse::<u32>(),
            cols[9].parse::<u32>(),
        ) else {
            continue;
        };

        let Ok(conf) = cols[10].parse::<f32>() else {
            continue;
        };
        if conf < 0.0 {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        detections.push(Detection {
            text: text.to_string(),
            bounds: (left, top, width, height),
            confidence: (conf / 100.0).clamp(0.0, 1.0),
        });
    }

    detections
}
