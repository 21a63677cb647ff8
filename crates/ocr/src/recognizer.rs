use docscan_core::{OcrConfig, OcrEngine, RecognizedText};
use image::{DynamicImage, GrayImage};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

use crate::preprocess::{encode_png, to_luma8};

/// Tesseract page segmentation mode 6: a single uniform block of text.
pub const PSM_SINGLE_BLOCK: &str = "6";

/// Tesseract engine mode 3: whatever the installed engine defaults to.
pub const OEM_DEFAULT: &str = "3";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("{0}")]
    Engine(String),
    #[error("OCR engine not found at '{}'", .0.display())]
    NotAvailable(PathBuf),
    #[error("{0} OCR engine is not compiled in; rebuild with the `tesseract` feature")]
    NotCompiled(&'static str),
}

/// Abstraction over an OCR backend.
/// Implementations accept PNG bytes of a single-channel page and return the raw text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, png: &[u8]) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(png)
    }
}

/// The backend `config.engine` asks for.
pub fn backend_from_config(config: &OcrConfig) -> Box<dyn OcrBackend> {
    match config.engine {
        OcrEngine::Cli => Box::new(TesseractCli::from_config(config)),
        #[cfg(feature = "tesseract")]
        OcrEngine::Library => Box::new(tesseract_backend::LeptessRecognizer::new(None, &config.language)),
        #[cfg(not(feature = "tesseract"))]
        OcrEngine::Library => {
            warn!("library OCR engine requested but not compiled in");
            Box::new(NotCompiled("library"))
        }
    }
}

/// Stands in for an engine this build lacks; every page fails with the reason.
#[cfg(not(feature = "tesseract"))]
struct NotCompiled(&'static str);

#[cfg(not(feature = "tesseract"))]
impl OcrBackend for NotCompiled {
    fn recognize(&self, _png: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::NotCompiled(self.0))
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string, or a pre-set failure, regardless of the image.
pub struct MockRecognizer {
    outcome: Result<String, String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { outcome: Ok(text.into()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self { outcome: Err(message.into()) }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _png: &[u8]) -> Result<String, OcrError> {
        self.outcome.clone().map_err(OcrError::Engine)
    }
}

// ── Tesseract command-line backend ────────────────────────────────────────────

/// Runs the `tesseract` executable, streaming the page through stdin/stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    cmd: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(cmd: impl Into<PathBuf>, language: &str) -> Self {
        Self { cmd: cmd.into(), language: language.to_string() }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.tesseract_cmd, &config.language)
    }
}

impl OcrBackend for TesseractCli {
    fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
        let mut child = Command::new(&self.cmd)
            .args(["stdin", "stdout", "--oem", OEM_DEFAULT, "--psm", PSM_SINGLE_BLOCK, "-l"])
            .arg(&self.language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::NotAvailable(self.cmd.clone()),
                _ => OcrError::Engine(format!("failed to start {}: {e}", self.cmd.display())),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A broken pipe here means the engine died early; its exit status says why.
            if let Err(e) = stdin.write_all(png) {
                debug!(error = %e, "tesseract closed stdin early");
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Engine(format!("failed to wait for tesseract: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(OcrError::Engine(if stderr.is_empty() {
                format!("tesseract exited with {}", output.status)
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Tesseract library backend (optional, gated behind `tesseract` feature) ───

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, PSM_SINGLE_BLOCK};
    use leptess::{LepTess, Variable};

    pub struct LeptessRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl LeptessRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for LeptessRecognizer {
        fn recognize(&self, png: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditPagesegMode, PSM_SINGLE_BLOCK)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(png)
                .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

// ── Infallible front door ─────────────────────────────────────────────────────

/// Wraps a backend so recognition never fails: engine errors become an
/// `OCR Error: ...` text and blank pages become the "no text" sentinel.
pub struct TextExtractor<R: OcrBackend> {
    backend: R,
}

impl<R: OcrBackend> TextExtractor<R> {
    pub fn new(backend: R) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    pub fn recognize(&self, page: &GrayImage) -> RecognizedText {
        let png = match encode_png(page) {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "could not encode page for OCR");
                return RecognizedText::engine_error(OcrError::ImageEncode(e.to_string()));
            }
        };

        match self.backend.recognize(&png) {
            Ok(raw) => {
                let text = RecognizedText::from_engine_output(raw);
                debug!(status = ?text.status(), chars = text.as_str().len(), "OCR finished");
                text
            }
            Err(e) => {
                warn!(error = %e, "OCR engine failed");
                RecognizedText::engine_error(e)
            }
        }
    }

    /// Like [`recognize`](Self::recognize) for rasters of any sample type;
    /// the page is normalized to 8-bit grayscale first.
    pub fn recognize_dynamic(&self, page: &DynamicImage) -> RecognizedText {
        self.recognize(&to_luma8(page))
    }
}
