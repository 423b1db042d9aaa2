//! Pipeline orchestration.
//!
//! Enumerates the input directory, runs extract → detect → redact → write
//! for each image, and isolates per-file failures: a bad scan is logged
//! and counted, never allowed to take down the batch.

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::error::PipelineError;
use crate::ocr::TextExtractor;
use crate::pii::PiiDetector;
use crate::redact;
use crate::report::{self, DocumentResult};

const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Per-batch counters.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files fully processed with all three artifacts written
    pub processed: usize,
    /// Directory entries with an unsupported extension
    pub skipped: usize,
    /// Files that hit an error in some stage
    pub failed: usize,
}

/// Process every supported image in `input_dir` sequentially.
///
/// Files are sorted by name so runs are deterministic regardless of
/// filesystem listing order. An unreadable input directory is fatal;
/// everything after that is per-file.
pub fn run(
    input_dir: &Path,
    output_dir: &Path,
    extractor: &mut dyn TextExtractor,
    detector: &PiiDetector,
    output: &OutputConfig,
) -> Result<RunSummary, PipelineError> {
    let mut summary = RunSummary::default();
    let mut files = Vec::new();

    let entries = std::fs::read_dir(input_dir).map_err(|e| {
        PipelineError::Configuration(format!("cannot read input directory {input_dir:?}: {e}"))
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| {
            PipelineError::Configuration(format!("cannot read input directory {input_dir:?}: {e}"))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_supported(&path) {
            files.push(path);
        } else {
            debug!("skipping unsupported file {:?}", path.file_name());
            summary.skipped += 1;
        }
    }
    files.sort();

    info!("processing {} image(s) from {input_dir:?}", files.len());

    for path in &files {
        let start = Instant::now();
        match process_document(path, output_dir, extractor, detector, output) {
            Ok(()) => {
                debug!("{:?} done in {:?}", path.file_name(), start.elapsed());
                summary.processed += 1;
            }
            Err(e) => {
                warn!("failed to process {path:?}: {e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "batch complete: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );
    Ok(summary)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
}

/// Run the full stage sequence for one image.
fn process_document(
    path: &Path,
    output_dir: &Path,
    extractor: &mut dyn TextExtractor,
    detector: &PiiDetector,
    output: &OutputConfig,
) -> Result<(), PipelineError> {
    let image = image::open(path).map_err(|e| PipelineError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;

    let detections = extractor.extract(&image)?;
    let pii_matches = detector.detect(&detections);

    // Masks are drawn on the original image, not the preprocessed one.
    let mut redacted = image.to_rgb8();
    redact::redact(&mut redacted, &detections, &pii_matches);

    let result = DocumentResult {
        source_image_path: path.to_path_buf(),
        detections,
        pii_matches,
        redacted_image: redacted,
    };
    report::write(&result, output_dir, output.jpeg_quality)?;

    info!(
        "{:?}: {} detections, {} PII matches",
        path.file_name().unwrap_or_default(),
        result.detections.len(),
        result.pii_matches.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::ocr::Detection;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;

    /// Extractor stand-in that replays canned detections and records how
    /// many images it was asked to read.
    struct MockExtractor {
        detections: Vec<Detection>,
        calls: usize,
        number_calls: bool,
    }

    impl MockExtractor {
        fn new(detections: Vec<Detection>) -> Self {
            Self {
                detections,
                calls: 0,
                number_calls: false,
            }
        }

        fn numbered() -> Self {
            Self {
                detections: Vec::new(),
                calls: 0,
                number_calls: true,
            }
        }
    }

    impl TextExtractor for MockExtractor {
        fn extract(&mut self, _image: &DynamicImage) -> Result<Vec<Detection>, PipelineError> {
            let detections = if self.number_calls {
                vec![Detection {
                    text: format!("call{}", self.calls),
                    bounds: (0, 0, 10, 10),
                    confidence: 1.0,
                }]
            } else {
                self.detections.clone()
            };
            self.calls += 1;
            Ok(detections)
        }
    }

    fn detector() -> PiiDetector {
        PiiDetector::new(&DetectionConfig::default())
    }

    fn write_png(dir: &Path, name: &str) {
        RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("scan.jpg")));
        assert!(is_supported(Path::new("scan.JPEG")));
        assert!(is_supported(Path::new("scan.png")));
        assert!(!is_supported(Path::new("scan.tiff")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn test_batch_with_corrupt_and_unsupported_files() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        write_png(input.path(), "form01.png");
        std::fs::write(input.path().join("broken.jpg"), b"not an image").unwrap();
        std::fs::write(input.path().join("notes.txt"), b"plain text").unwrap();

        let mut extractor = MockExtractor::new(vec![Detection {
            text: "Phone: 9876543210".to_string(),
            bounds: (2, 2, 20, 8),
            confidence: 0.9,
        }]);

        let summary = run(
            input.path(),
            output.path(),
            &mut extractor,
            &detector(),
            &OutputConfig::default(),
        )
        .unwrap();

        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                skipped: 1,
                failed: 1
            }
        );

        // The valid image's three artifacts exist despite the corrupt sibling
        assert!(output.path().join("form01_text.txt").exists());
        assert!(output.path().join("form01_pii.txt").exists());
        assert!(output.path().join("form01_redacted.jpg").exists());

        let pii = std::fs::read_to_string(output.path().join("form01_pii.txt")).unwrap();
        assert_eq!(pii.lines().collect::<Vec<_>>(), vec!["phone_number: 9876543210"]);
    }

    #[test]
    fn test_files_processed_in_sorted_order() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        // Created out of name order on purpose
        write_png(input.path(), "b.png");
        write_png(input.path(), "a.png");

        let mut extractor = MockExtractor::numbered();
        let summary = run(
            input.path(),
            output.path(),
            &mut extractor,
            &detector(),
            &OutputConfig::default(),
        )
        .unwrap();

        assert_eq!(summary.processed, 2);
        let a_text = std::fs::read_to_string(output.path().join("a_text.txt")).unwrap();
        let b_text = std::fs::read_to_string(output.path().join("b_text.txt")).unwrap();
        assert_eq!(a_text, "call0\n");
        assert_eq!(b_text, "call1\n");
    }

    #[test]
    fn test_redacted_output_masks_matched_region() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_png(input.path(), "form.png");

        let mut extractor = MockExtractor::new(vec![Detection {
            text: "9876543210".to_string(),
            bounds: (4, 4, 12, 6),
            confidence: 0.95,
        }]);

        run(
            input.path(),
            output.path(),
            &mut extractor,
            &detector(),
            &OutputConfig::default(),
        )
        .unwrap();

        let redacted = image::open(output.path().join("form_redacted.jpg"))
            .unwrap()
            .to_rgb8();
        // JPEG is lossy; the masked region must still be near-black and the
        // rest near-white.
        let masked = redacted.get_pixel(8, 6);
        let clear = redacted.get_pixel(28, 28);
        assert!(masked.0[0] < 60, "masked pixel too bright: {masked:?}");
        assert!(clear.0[0] > 200, "clear pixel too dark: {clear:?}");
    }

    #[test]
    fn test_empty_input_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let mut extractor = MockExtractor::new(Vec::new());
        let summary = run(
            input.path(),
            output.path(),
            &mut extractor,
            &detector(),
            &OutputConfig::default(),
        )
        .unwrap();

        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_missing_input_directory_is_fatal() {
        let output = TempDir::new().unwrap();
        let mut extractor = MockExtractor::new(Vec::new());

        let err = run(
            Path::new("/nonexistent/scans"),
            output.path(),
            &mut extractor,
            &detector(),
            &OutputConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Configuration(_)));
    }
}
