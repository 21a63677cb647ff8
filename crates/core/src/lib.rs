pub mod config;
pub mod document;
pub mod fields;
pub mod text;
pub mod upload;

pub use config::{Config, ConfigError, OcrConfig, OcrEngine, PdfConfig};
pub use document::DocumentType;
pub use fields::FieldMap;
pub use text::{RecognizedText, TextStatus};
pub use upload::{ScanSubmission, UploadKind};
