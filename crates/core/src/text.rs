use serde::{Deserialize, Serialize};
use std::fmt;

/// Stands in for a page on which the engine found nothing.
pub const NO_TEXT_DETECTED: &str = "No text detected";

/// Prefix of the text produced when the OCR engine fails.
pub const OCR_ERROR_PREFIX: &str = "OCR Error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStatus {
    Recognized,
    Empty,
    EngineError,
}

/// All text recognized on a page, line breaks preserved.
///
/// Never empty: a blank page becomes [`NO_TEXT_DETECTED`] and an engine
/// failure becomes a descriptive `OCR Error: ...` string, so downstream
/// matchers always have something to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedText {
    text: String,
    status: TextStatus,
}

impl RecognizedText {
    pub fn from_engine_output(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            Self::empty()
        } else {
            Self { text: trimmed.to_string(), status: TextStatus::Recognized }
        }
    }

    pub fn engine_error(message: impl fmt::Display) -> Self {
        Self {
            text: format!("{OCR_ERROR_PREFIX}{message}"),
            status: TextStatus::EngineError,
        }
    }

    /// Text the user corrected during review.
    pub fn edited(text: impl AsRef<str>) -> Self {
        Self::from_engine_output(text)
    }

    fn empty() -> Self {
        Self { text: NO_TEXT_DETECTED.to_string(), status: TextStatus::Empty }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> TextStatus {
        self.status
    }

    pub fn is_degraded(&self) -> bool {
        self.status != TextStatus::Recognized
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for RecognizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for RecognizedText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
