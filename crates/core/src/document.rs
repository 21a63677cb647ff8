use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of document kinds the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DocumentType {
    Aadhaar,
    Pan,
    Passport,
    DrivingLicense,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Aadhaar,
        DocumentType::Pan,
        DocumentType::Passport,
        DocumentType::DrivingLicense,
        DocumentType::Other,
    ];

    /// Human-facing label, also the value persisted in the record store.
    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Aadhaar => "Aadhaar",
            DocumentType::Pan => "PAN",
            DocumentType::Passport => "Passport",
            DocumentType::DrivingLicense => "Driving License",
            DocumentType::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown document type: '{s}'"))
    }
}

impl From<DocumentType> for String {
    fn from(t: DocumentType) -> Self {
        t.label().to_string()
    }
}

impl TryFrom<String> for DocumentType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
