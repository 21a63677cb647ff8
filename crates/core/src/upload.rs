use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::document::DocumentType;
use crate::fields::FieldMap;
use crate::text::RecognizedText;

/// The upload encodings accepted at the boundary. Anything else is rejected
/// before it reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Jpeg,
    Png,
    Pdf,
}

impl UploadKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(UploadKind::Jpeg),
            "image/png" => Some(UploadKind::Png),
            "application/pdf" => Some(UploadKind::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(UploadKind::Jpeg),
            "png" => Some(UploadKind::Png),
            "pdf" => Some(UploadKind::Pdf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            UploadKind::Jpeg => "image/jpeg",
            UploadKind::Png => "image/png",
            UploadKind::Pdf => "application/pdf",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            UploadKind::Jpeg => "jpg",
            UploadKind::Png => "png",
            UploadKind::Pdf => "pdf",
        }
    }

    pub fn is_pdf(self) -> bool {
        self == UploadKind::Pdf
    }
}

/// What the user confirmed after reviewing a scan; handed to the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSubmission {
    pub filename: String,
    pub doc_type: DocumentType,
    pub text: RecognizedText,
    pub fields: FieldMap,
    pub file_path: Option<PathBuf>,
}
