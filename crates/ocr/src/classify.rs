use docscan_core::DocumentType;

/// Trigger substrings per type, checked top to bottom. The first type with any
/// matching trigger wins, so a page mentioning both "aadhaar" and "passport"
/// is an Aadhaar card.
const RULES: &[(DocumentType, &[&str])] = &[
    (DocumentType::Aadhaar, &["aadhaar"]),
    (DocumentType::Pan, &["permanent account number", "incometax department"]),
    (DocumentType::Passport, &["passport", "republic of india"]),
    (DocumentType::DrivingLicense, &["driving licence", "union of india"]),
];

/// Case-insensitive keyword classification of recognized text.
pub fn classify(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::Other)
}
