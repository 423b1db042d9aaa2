//! Application Configuration
//!
//! Runtime settings stored in TOML format. Every section and field has a
//! default, so a partial (or absent) config file is valid; CLI flags
//! override file values in `main`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::pii::PiiCategory;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// OCR engine settings
    #[serde(default)]
    pub ocr: OcrConfig,
    /// PII detection settings
    #[serde(default)]
    pub detection: DetectionConfig,
    /// Output artifact settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// OCR engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language code (e.g., "eng")
    pub language: String,
    /// Tesseract page segmentation mode (6 = uniform block of text)
    pub psm: u32,
    /// Source resolution hint in dots per inch
    pub dpi: u32,
    /// Apply grayscale/blur/threshold preprocessing before OCR
    pub preprocessing: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 6,
            dpi: 300,
            preprocessing: true,
        }
    }
}

/// PII detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum OCR confidence for a detection to participate in PII
    /// matching (0.0 - 1.0, 0.0 disables the filter)
    pub min_confidence: f32,
    /// Maximum pixel distance between a field label and its value
    pub max_label_distance: f32,
    /// Categories excluded from matching
    pub disabled_categories: Vec<PiiCategory>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.4,
            max_label_distance: 250.0,
            disabled_categories: Vec::new(),
        }
    }
}

/// Output artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG quality for the redacted image (1 - 100)
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}
