pub mod classify;
pub mod extract;
pub mod pdf;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod upload;

pub use classify::classify;
pub use extract::extract_fields;
pub use pdf::PdfRasterizer;
pub use pipeline::{DocumentPipeline, PipelineError, ScanOutcome};
pub use preprocess::{correct_perspective, decode_image, enhance, to_luma8, PreprocessError};
pub use recognizer::{
    backend_from_config, MockRecognizer, OcrBackend, OcrError, TesseractCli, TextExtractor,
};
pub use upload::{sha256_bytes, sha256_hex, store_upload, upload_path};
