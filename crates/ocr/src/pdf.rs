use docscan_core::PdfConfig;
use image::RgbImage;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

use crate::preprocess::{decode_image, PreprocessError};

/// Renders the first page of a PDF through poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    cmd: PathBuf,
    dpi: u32,
}

impl PdfRasterizer {
    pub fn new(cmd: impl Into<PathBuf>, dpi: u32) -> Self {
        Self { cmd: cmd.into(), dpi }
    }

    pub fn from_config(config: &PdfConfig) -> Self {
        Self::new(&config.pdftoppm_cmd, config.dpi)
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Rasterize page 1 only; later pages are never rendered.
    pub fn first_page(&self, pdf_bytes: &[u8]) -> Result<RgbImage, PreprocessError> {
        if pdf_bytes.is_empty() {
            return Err(PreprocessError::EmptyDocument);
        }

        let workdir = tempfile::tempdir()?;
        let pdf_path = workdir.path().join("upload.pdf");
        let output_prefix = workdir.path().join("page");
        std::fs::write(&pdf_path, pdf_bytes)?;

        let dpi = self.dpi.to_string();
        let output = Command::new(&self.cmd)
            .args(["-png", "-singlefile", "-f", "1", "-l", "1", "-r", dpi.as_str()])
            .arg(&pdf_path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    warn!(cmd = %self.cmd.display(), "pdftoppm not found");
                    PreprocessError::RasterizerUnavailable(self.cmd.clone())
                } else {
                    PreprocessError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, %stderr, "pdftoppm failed");
            return Err(PreprocessError::Rasterize(if stderr.is_empty() {
                format!("pdftoppm exited with {}", output.status)
            } else {
                stderr
            }));
        }

        // -singlefile drops the page-number suffix.
        let page_path = output_prefix.with_extension("png");
        let page_bytes = std::fs::read(&page_path).map_err(|_| {
            PreprocessError::Rasterize("pdftoppm produced no page image".to_string())
        })?;
        debug!(dpi = self.dpi, bytes = page_bytes.len(), "rasterized first PDF page");

        decode_image(&page_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_rejected_before_spawning() {
        let r = PdfRasterizer::new("/nonexistent/pdftoppm", 200);
        assert!(matches!(r.first_page(&[]), Err(PreprocessError::EmptyDocument)));
    }

    #[test]
    fn missing_rasterizer_is_reported() {
        let r = PdfRasterizer::new("/nonexistent/bin/pdftoppm", 200);
        match r.first_page(b"%PDF-1.4\n%%EOF") {
            Err(PreprocessError::RasterizerUnavailable(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/bin/pdftoppm"));
            }
            other => panic!("expected RasterizerUnavailable, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_rasterizer_is_reported() {
        // `false` exits non-zero without writing anything.
        let r = PdfRasterizer::new("false", 200);
        assert!(matches!(
            r.first_page(b"%PDF-1.4\n%%EOF"),
            Err(PreprocessError::Rasterize(_))
        ));
    }

    #[test]
    fn from_config_uses_configured_values() {
        let cfg = PdfConfig { pdftoppm_cmd: PathBuf::from("/opt/poppler/pdftoppm"), dpi: 300 };
        let r = PdfRasterizer::from_config(&cfg);
        assert_eq!(r.dpi(), 300);
        assert_eq!(r.cmd, PathBuf::from("/opt/poppler/pdftoppm"));
    }
}
