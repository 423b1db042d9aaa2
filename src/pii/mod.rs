//! PII detection over OCR detections.
//!
//! The only component with real logic: applies the rule set from
//! [`rules`] to every detection, pairs bare field labels with their
//! values by reading order and spatial proximity, and emits one
//! [`PiiMatch`] per rule hit. Rules are independent; one detection may
//! yield matches in several categories.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::config::DetectionConfig;
use crate::ocr::Detection;
use rules::{is_label_filler, normalize_phone, trim_value, RuleSet};

/// Closed set of PII categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    PatientName,
    IpdNumber,
    Uhid,
    Age,
    Sex,
    PhoneNumber,
    Date,
    /// Long numeric identifiers not covered by a more specific category
    Other,
}

impl PiiCategory {
    pub const ALL: [PiiCategory; 8] = [
        PiiCategory::PatientName,
        PiiCategory::IpdNumber,
        PiiCategory::Uhid,
        PiiCategory::Age,
        PiiCategory::Sex,
        PiiCategory::PhoneNumber,
        PiiCategory::Date,
        PiiCategory::Other,
    ];

    /// Stable snake_case name, used in the PII report and config files.
    pub fn name(&self) -> &'static str {
        match self {
            PiiCategory::PatientName => "patient_name",
            PiiCategory::IpdNumber => "ipd_number",
            PiiCategory::Uhid => "uhid",
            PiiCategory::Age => "age",
            PiiCategory::Sex => "sex",
            PiiCategory::PhoneNumber => "phone_number",
            PiiCategory::Date => "date",
            PiiCategory::Other => "other",
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PiiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PiiCategory::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown PII category '{s}'"))
    }
}

/// One PII rule hit.
#[derive(Debug, Clone, PartialEq)]
pub struct PiiMatch {
    pub category: PiiCategory,
    /// The matched text (possibly a substring of the source detection)
    pub matched_text: String,
    /// Index of the source detection in the extractor's output
    pub detection_index: usize,
}

/// PII detector holding the compiled rule set and matching policy.
pub struct PiiDetector {
    rules: RuleSet,
    min_confidence: f32,
    max_label_distance: f32,
    disabled: Vec<PiiCategory>,
}

impl PiiDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            rules: RuleSet::new(),
            min_confidence: config.min_confidence,
            max_label_distance: config.max_label_distance,
            disabled: config.disabled_categories.clone(),
        }
    }

    fn enabled(&self, category: PiiCategory) -> bool {
        !self.disabled.contains(&category)
    }

    /// Low-confidence detections are excluded from matching (they still
    /// appear in the text report).
    fn eligible(&self, detection: &Detection) -> bool {
        detection.confidence >= self.min_confidence
    }

    /// Apply all rules to a sequence of detections.
    pub fn detect(&self, detections: &[Detection]) -> Vec<PiiMatch> {
        let mut matches = Vec::new();

        for (index, detection) in detections.iter().enumerate() {
            if !self.eligible(detection) {
                continue;
            }

            self.apply_content_rules(index, &detection.text, &mut matches);
            self.apply_label_rules(detections, index, &mut matches);
        }

        matches
    }

    fn apply_content_rules(&self, index: usize, text: &str, matches: &mut Vec<PiiMatch>) {
        // Spans already claimed by phone/date rules; the long-number rule
        // must not report the same digits again as `other`.
        let mut claimed: Vec<Range<usize>> = Vec::new();

        if self.enabled(PiiCategory::PhoneNumber) {
            for m in self.rules.phone.find_iter(text) {
                if let Some(digits) = normalize_phone(m.as_str()) {
                    claimed.push(m.range());
                    matches.push(PiiMatch {
                        category: PiiCategory::PhoneNumber,
                        matched_text: digits,
                        detection_index: index,
                    });
                }
            }
        }

        if self.enabled(PiiCategory::Date) {
            for m in self.rules.date.find_iter(text) {
                claimed.push(m.range());
                matches.push(PiiMatch {
                    category: PiiCategory::Date,
                    matched_text: m.as_str().to_string(),
                    detection_index: index,
                });
            }
        }

        if self.enabled(PiiCategory::Other) {
            for m in self.rules.long_number.find_iter(text) {
                let range = m.range();
                if claimed.iter().any(|c| c.start < range.end && range.start < c.end) {
                    continue;
                }
                matches.push(PiiMatch {
                    category: PiiCategory::Other,
                    matched_text: m.as_str().to_string(),
                    detection_index: index,
                });
            }
        }
    }

    fn apply_label_rules(&self, detections: &[Detection], index: usize, matches: &mut Vec<PiiMatch>) {
        let text = detections[index].text.as_str();

        for rule in &self.rules.labels {
            if !self.enabled(rule.category) {
                continue;
            }

            // Inline form: "Age: 34" within one detection.
            if let Some(caps) = rule.inline.captures(text) {
                let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
                if self.rules.valid_value(rule.category, value) {
                    matches.push(PiiMatch {
                        category: rule.category,
                        matched_text: value.to_string(),
                        detection_index: index,
                    });
                }
                continue;
            }

            // Split form: the detection is the label alone, value follows.
            if rule.bare.is_match(text.trim()) {
                self.pair_label(detections, index, rule.category, matches);
            }
        }
    }

    /// Pair a bare label detection with its value.
    ///
    /// Policy: scan forward in reading order; the first eligible,
    /// non-filler detection wins if its left-center lies within
    /// `max_label_distance` of the label's right-center. If that nearest
    /// candidate is out of range, is itself a label, or fails value
    /// validation, the label yields nothing. "First in reading order" is
    /// the tie-break, so the outcome is deterministic.
    fn pair_label(
        &self,
        detections: &[Detection],
        label_index: usize,
        category: PiiCategory,
        matches: &mut Vec<PiiMatch>,
    ) {
        let label = &detections[label_index];

        for (candidate_index, candidate) in detections.iter().enumerate().skip(label_index + 1) {
            if !self.eligible(candidate) || is_label_filler(&candidate.text) {
                continue;
            }

            if distance(label.right_center(), candidate.left_center()) > self.max_label_distance {
                return;
            }

            let value = trim_value(&candidate.text);
            if self.rules.is_label(value) || !self.rules.valid_value(category, value) {
                return;
            }

            matches.push(PiiMatch {
                category,
                matched_text: value.to_string(),
                detection_index: candidate_index,
            });

            // Names usually span several words at word granularity;
            // absorb immediate continuations so "John" and "Doe" are both
            // matched (and both redacted).
            if category == PiiCategory::PatientName {
                self.absorb_name_words(detections, candidate_index, matches);
            }
            return;
        }
    }

    fn absorb_name_words(
        &self,
        detections: &[Detection],
        first_index: usize,
        matches: &mut Vec<PiiMatch>,
    ) {
        const MAX_NAME_WORDS: usize = 3;

        let mut previous = first_index;
        for index in (first_index + 1)..detections.len().min(first_index + MAX_NAME_WORDS) {
            let candidate = &detections[index];
            let value = trim_value(&candidate.text);

            if !self.eligible(candidate)
                || self.rules.is_label(value)
                || !self.rules.valid_value(PiiCategory::PatientName, value)
            {
                return;
            }
            let anchor = detections[previous].right_center();
            if distance(anchor, candidate.left_center()) > self.max_label_distance {
                return;
            }

            matches.push(PiiMatch {
                category: PiiCategory::PatientName,
                matched_text: value.to_string(),
                detection_index: index,
            });
            previous = index;
        }
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}
