use docscan_core::{Config, DocumentType, FieldMap, RecognizedText, ScanSubmission, UploadKind};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::classify::classify;
use crate::extract::extract_fields;
use crate::pdf::PdfRasterizer;
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{backend_from_config, OcrBackend, TextExtractor};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to load document: {0}")]
    Load(#[from] PreprocessError),
    #[error("Unsupported upload type: {0}")]
    Unsupported(String),
}

/// Everything one pass over an upload produces.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The decoded page, for display.
    pub original: RgbImage,
    /// The binarized page that was fed to OCR.
    pub enhanced: GrayImage,
    pub text: RecognizedText,
    pub doc_type: DocumentType,
    pub fields: FieldMap,
}

impl ScanOutcome {
    /// The submission a user confirms when they accept the scan unchanged.
    pub fn into_submission(self, filename: impl Into<String>, file_path: Option<PathBuf>) -> ScanSubmission {
        ScanSubmission {
            filename: filename.into(),
            doc_type: self.doc_type,
            text: self.text,
            fields: self.fields,
            file_path,
        }
    }
}

/// Orchestrates: decode → perspective → enhance → OCR → classify → extract.
///
/// Holds no per-document state; every call is independent.
pub struct DocumentPipeline<R: OcrBackend> {
    extractor: TextExtractor<R>,
    rasterizer: PdfRasterizer,
}

impl DocumentPipeline<Box<dyn OcrBackend>> {
    /// Pipeline backed by the OCR engine and pdftoppm executable from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(backend_from_config(&config.ocr), PdfRasterizer::from_config(&config.pdf))
    }
}

impl<R: OcrBackend> DocumentPipeline<R> {
    pub fn new(recognizer: R, rasterizer: PdfRasterizer) -> Self {
        Self { extractor: TextExtractor::new(recognizer), rasterizer }
    }

    /// Decode an upload into canonical RGB; PDFs contribute their first page.
    pub fn decode(&self, kind: UploadKind, data: &[u8]) -> Result<RgbImage, PreprocessError> {
        match kind {
            UploadKind::Jpeg | UploadKind::Png => preprocess::decode_image(data),
            UploadKind::Pdf => self.rasterizer.first_page(data),
        }
    }

    /// Run a file from disk, inferring its kind from the extension.
    pub fn process_file(&self, path: &Path) -> Result<ScanOutcome, PipelineError> {
        let kind = UploadKind::from_path(path)
            .ok_or_else(|| PipelineError::Unsupported(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        self.process(kind, &data)
    }

    /// Only an unreadable upload is an error. OCR trouble degrades to an
    /// error text that simply classifies as `Other`.
    pub fn process(&self, kind: UploadKind, data: &[u8]) -> Result<ScanOutcome, PipelineError> {
        debug!(?kind, bytes = data.len(), "loading document");
        let decoded = self.decode(kind, data)?;

        let page = preprocess::correct_perspective(DynamicImage::ImageRgb8(decoded));

        debug!("enhancing image");
        let enhanced = preprocess::enhance(&page);

        debug!("running OCR");
        let text = self.extractor.recognize(&enhanced);

        let doc_type = classify(text.as_str());
        let fields = extract_fields(text.as_str(), doc_type);
        info!(%doc_type, text_status = ?text.status(), fields = fields.len(), "document processed");

        Ok(ScanOutcome { original: page.into_rgb8(), enhanced, text, doc_type, fields })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
