//! PII pattern rules.
//!
//! Regex rules tuned to common Indian medical-form field labels and value
//! formats. Content rules match a detection's text on their own; label
//! rules come in two forms, inline (label and value inside one detection,
//! typical for line-level OCR) and bare (the detection is just the label,
//! its value lives in a following detection).

use regex::Regex;

use super::PiiCategory;

/// A field-label rule for one PII category.
pub struct LabelRule {
    pub category: PiiCategory,
    /// Label followed by its value in the same text, value captured as
    /// group 1
    pub inline: Regex,
    /// The whole text is the label alone ("Age:", "UHID No.")
    pub bare: Regex,
}

/// Compiled rule set, built once per detector.
pub struct RuleSet {
    /// 10-digit phone numbers, optional +91/0 prefix and separators
    pub phone: Regex,
    /// DD/MM/YYYY, DD-MM-YYYY and textual-month dates
    pub date: Regex,
    /// Long numeric identifiers (6+ digits), reported as `other`
    pub long_number: Regex,
    pub labels: Vec<LabelRule>,
    name_value: Regex,
    id_value: Regex,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern is valid")
}

impl RuleSet {
    pub fn new() -> Self {
        let months = "jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec";

        Self {
            phone: re(r"\b0?\d{5}[\s-]?\d{5}\b|\+91[\s-]?\d{5}[\s-]?\d{5}\b"),
            date: re(&format!(
                r"(?i)\b\d{{1,2}}[/-]\d{{1,2}}[/-]\d{{2,4}}\b|\b\d{{1,2}}\s+(?:{months})[a-z]*\.?,?\s+\d{{2,4}}\b|\b(?:{months})[a-z]*\.?\s+\d{{1,2}},?\s+\d{{2,4}}\b"
            )),
            long_number: re(r"\b\d{6,}\b"),
            labels: vec![
                LabelRule {
                    category: PiiCategory::PatientName,
                    inline: re(r"(?i)\b(?:patient\s+)?name\s*[:\-]\s*([a-z][a-z .]*)"),
                    bare: re(r"(?i)^(?:patient\s+)?name\s*[:\-]?$"),
                },
                LabelRule {
                    category: PiiCategory::IpdNumber,
                    inline: re(r"(?i)\bipd\s*(?:no\.?)?\s*[:\-]?\s*([a-z0-9][a-z0-9/]*)"),
                    bare: re(r"(?i)^ipd\s*(?:no\.?)?\s*[:\-]?$"),
                },
                LabelRule {
                    category: PiiCategory::Uhid,
                    inline: re(r"(?i)\buhid\s*(?:no\.?)?\s*[:\-]?\s*([a-z0-9][a-z0-9/]*)"),
                    bare: re(r"(?i)^uhid\s*(?:no\.?)?\s*[:\-]?$"),
                },
                LabelRule {
                    category: PiiCategory::Age,
                    inline: re(r"(?i)\bage\s*[:\-]?\s*(\d{1,3})\b"),
                    bare: re(r"(?i)^age\s*[:\-]?$"),
                },
                LabelRule {
                    category: PiiCategory::Sex,
                    inline: re(r"(?i)\b(?:sex|gender)\s*[:\-]?\s*(male|female|other|[mf])\b"),
                    bare: re(r"(?i)^(?:sex|gender)\s*[:\-]?$"),
                },
            ],
            name_value: re(r"(?i)^[a-z][a-z.' ]*$"),
            id_value: re(r"(?i)^[a-z0-9/]+$"),
        }
    }

    /// Validate a candidate value string for a label category. Used for
    /// inline captures and for paired split values alike.
    pub fn valid_value(&self, category: PiiCategory, value: &str) -> bool {
        match category {
            PiiCategory::PatientName => self.name_value.is_match(value),
            PiiCategory::IpdNumber | PiiCategory::Uhid => {
                self.id_value.is_match(value) && value.chars().any(|c| c.is_ascii_digit())
            }
            PiiCategory::Age => matches!(value.parse::<u32>(), Ok(n) if (1..=120).contains(&n)),
            PiiCategory::Sex => {
                let v = value.to_ascii_lowercase();
                matches!(v.as_str(), "m" | "f" | "male" | "female" | "other")
            }
            // Content-rule categories never go through label pairing
            PiiCategory::PhoneNumber | PiiCategory::Date | PiiCategory::Other => false,
        }
    }

    /// True if the text is itself a field label (used so a label is never
    /// taken as another label's value).
    pub fn is_label(&self, text: &str) -> bool {
        self.labels.iter().any(|r| r.bare.is_match(text))
    }
}

/// Reduce a phone match to its 10 significant digits, dropping the +91 or
/// trunk-0 prefix and any separators. Returns None if the digit count is
/// not a plausible phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => Some(digits),
        11 if digits.starts_with('0') => Some(digits[1..].to_string()),
        12 if digits.starts_with("91") => Some(digits[2..].to_string()),
        _ => None,
    }
}

/// Strip trailing field punctuation OCR tends to attach to words.
pub fn trim_value(text: &str) -> &str {
    text.trim().trim_end_matches([',', ';', ':'])
}

/// Filler tokens like "No." between a label word and its value
/// ("UHID" / "No." / "12345" at word granularity).
pub fn is_label_filler(text: &str) -> bool {
    matches!(
        trim_value(text).to_ascii_lowercase().as_str(),
        "no" | "no." | "number"
    )
}
