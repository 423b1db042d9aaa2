//! Image preprocessing for OCR.
//!
//! Scanned and photographed forms often have uneven lighting and faint
//! handwriting; a grayscale / blur / adaptive-threshold pass before OCR
//! noticeably improves Tesseract's output on them.

use image::{DynamicImage, GrayImage};
use imageproc::contrast::adaptive_threshold;
use imageproc::filter::gaussian_blur_f32;

/// Blur sigma roughly equivalent to a 5x5 Gaussian kernel.
const BLUR_SIGMA: f32 = 1.0;

/// Neighborhood radius for the adaptive threshold.
const THRESHOLD_BLOCK_RADIUS: u32 = 15;

/// Prepare an image for OCR: grayscale, light denoise, then adaptive
/// threshold to handle uneven lighting. Output dimensions match the input.
pub fn prepare_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, BLUR_SIGMA);
    adaptive_threshold(&blurred, THRESHOLD_BLOCK_RADIUS)
}
