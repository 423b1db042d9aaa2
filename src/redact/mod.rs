//! Image redaction.
//!
//! Masks every PII match's source region with an opaque black rectangle.
//! Regions are clipped to the image bounds; drawing over the same region
//! twice is a no-op beyond the first pass.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::ocr::Detection;
use crate::pii::PiiMatch;

const MASK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Black out the bounding box of every match's source detection.
pub fn redact(image: &mut RgbImage, detections: &[Detection], matches: &[PiiMatch]) {
    let dimensions = image.dimensions();
    let mut drawn = 0usize;

    for pii in matches {
        let Some(detection) = detections.get(pii.detection_index) else {
            continue;
        };
        if let Some(rect) = clip_to_image(detection.bounds, dimensions) {
            draw_filled_rect_mut(image, rect, MASK_COLOR);
            drawn += 1;
        }
    }

    debug!("redacted {drawn} of {} matched regions", matches.len());
}

/// Clip a bounding box to the image. Returns None for regions that are
/// empty or lie entirely outside the image.
fn clip_to_image(
    (x, y, w, h): (u32, u32, u32, u32),
    (img_w, img_h): (u32, u32),
) -> Option<Rect> {
    if x >= img_w || y >= img_h || w == 0 || h == 0 {
        return None;
    }

    let w = w.min(img_w - x);
    let h = h.min(img_h - y);

    Some(Rect::at(x as i32, y as i32).of_size(w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_image(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn detection(x: u32, y: u32, w: u32, h: u32) -> Detection {
        Detection {
            text: "secret".to_string(),
            bounds: (x, y, w, h),
            confidence: 0.9,
        }
    }

    fn pii_match(index: usize) -> PiiMatch {
        PiiMatch {
            category: crate::pii::PiiCategory::PhoneNumber,
            matched_text: "secret".to_string(),
            detection_index: index,
        }
    }

    #[test]
    fn test_region_is_blacked_out() {
        let mut img = white_image(100, 100);
        let detections = vec![detection(10, 10, 30, 20)];

        redact(&mut img, &detections, &[pii_match(0)]);

        assert_eq!(*img.get_pixel(10, 10), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(39, 29), Rgb([0, 0, 0]));
        // Just outside the region stays white
        assert_eq!(*img.get_pixel(40, 30), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(9, 9), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_no_matches_leaves_image_untouched() {
        let mut img = white_image(50, 50);
        let original = img.clone();
        let detections = vec![detection(5, 5, 10, 10)];

        redact(&mut img, &detections, &[]);
        assert_eq!(img, original);
    }

    #[test]
    fn test_redaction_is_idempotent() {
        let mut img = white_image(100, 100);
        let detections = vec![detection(10, 10, 30, 20), detection(20, 15, 30, 20)];
        let matches = vec![pii_match(0), pii_match(1)];

        redact(&mut img, &detections, &matches);
        let first_pass = img.clone();

        redact(&mut img, &detections, &matches);
        assert_eq!(img, first_pass);
    }

    #[test]
    fn test_out_of_bounds_region_is_clipped() {
        let mut img = white_image(50, 50);
        let detections = vec![detection(40, 40, 30, 30)];

        redact(&mut img, &detections, &[pii_match(0)]);

        assert_eq!(*img.get_pixel(40, 40), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(49, 49), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(39, 39), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_fully_outside_region_is_skipped() {
        let mut img = white_image(50, 50);
        let original = img.clone();
        let detections = vec![detection(60, 60, 10, 10)];

        redact(&mut img, &detections, &[pii_match(0)]);
        assert_eq!(img, original);
    }

    #[test]
    fn test_dangling_detection_index_is_ignored() {
        let mut img = white_image(50, 50);
        let original = img.clone();

        redact(&mut img, &[], &[pii_match(7)]);
        assert_eq!(img, original);
    }

    #[test]
    fn test_clip_to_image() {
        assert_eq!(
            clip_to_image((10, 10, 20, 20), (100, 100)),
            Some(Rect::at(10, 10).of_size(20, 20))
        );
        assert_eq!(
            clip_to_image((90, 90, 20, 20), (100, 100)),
            Some(Rect::at(90, 90).of_size(10, 10))
        );
        assert_eq!(clip_to_image((100, 10, 5, 5), (100, 100)), None);
        assert_eq!(clip_to_image((10, 10, 0, 5), (100, 100)), None);
    }
}
