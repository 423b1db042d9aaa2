//! Text extraction layer.
//!
//! Wraps the external OCR engine behind a trait so the rest of the
//! pipeline can be exercised without a Tesseract installation. The only
//! production backend is Tesseract via leptess.

pub mod preprocess;
pub mod tesseract;

pub use tesseract::TesseractExtractor;

use crate::error::PipelineError;
use image::DynamicImage;

/// One OCR-recognized text span.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Recognized text
    pub text: String,
    /// Bounding box (x, y, width, height) in image pixel coordinates,
    /// origin top-left
    pub bounds: (u32, u32, u32, u32),
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl Detection {
    /// Center of the left edge. Used as the anchor when this detection is
    /// a candidate value for a field label.
    pub fn left_center(&self) -> (f32, f32) {
        let (x, y, _w, h) = self.bounds;
        (x as f32, y as f32 + h as f32 / 2.0)
    }

    /// Center of the right edge. Used as the anchor when this detection is
    /// a field label looking for its value.
    pub fn right_center(&self) -> (f32, f32) {
        let (x, y, w, h) = self.bounds;
        (x as f32 + w as f32, y as f32 + h as f32 / 2.0)
    }
}

/// Text extraction backend.
///
/// The engine is constructed once at startup and reused for every image in
/// the batch; `extract` takes `&mut self` because Tesseract's recognition
/// state is per-image.
pub trait TextExtractor {
    /// Run OCR over a decoded image.
    ///
    /// Returns detections in the engine's output order (reading order for
    /// Tesseract). An image with no recognizable text yields an empty
    /// vector, not an error.
    fn extract(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, PipelineError>;
}
