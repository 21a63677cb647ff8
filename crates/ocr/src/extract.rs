use std::sync::OnceLock;

use docscan_core::fields::{DOB, ID_NUMBER, INFO, NAME, NAME_PLACEHOLDER, RAW_TEXT_ONLY};
use docscan_core::{DocumentType, FieldMap};
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_aadhaar_number, r"\b[0-9]{4} [0-9]{4} [0-9]{4}\b");
re!(re_dob, r"\b[0-9]{2}/[0-9]{2}/[0-9]{4}\b");
re!(re_pan_number, r"[A-Z]{5}[0-9]{4}[A-Z]");
re!(re_passport_number, r"[A-Z][0-9]{7}");
re!(re_dl_number, r"[A-Z]{2}[- ][0-9]{2}[- ][0-9]{4}[- ][0-9]{7}");

fn first_match<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.find(text).map(|m| m.as_str())
}

/// Pull the type-specific fields out of recognized text.
///
/// Every field a type defines is always present; a pattern with no match is
/// reported as `"Not Found"`. Only the first occurrence of each pattern counts.
pub fn extract_fields(text: &str, doc_type: DocumentType) -> FieldMap {
    let mut fields = FieldMap::new();
    match doc_type {
        DocumentType::Aadhaar => {
            fields.set_match(ID_NUMBER, first_match(re_aadhaar_number(), text));
            fields.set(NAME, NAME_PLACEHOLDER);
            fields.set_match(DOB, first_match(re_dob(), text));
        }
        DocumentType::Pan => {
            fields.set_match(ID_NUMBER, first_match(re_pan_number(), text));
            fields.set(NAME, NAME_PLACEHOLDER);
        }
        DocumentType::Passport => {
            fields.set_match(ID_NUMBER, first_match(re_passport_number(), text));
        }
        DocumentType::DrivingLicense => {
            fields.set_match(ID_NUMBER, first_match(re_dl_number(), text));
        }
        DocumentType::Other => {
            fields.set(INFO, RAW_TEXT_ONLY);
        }
    }
    fields
}

// ── Tests ─────────────────────────────────────────────────────────────────────
