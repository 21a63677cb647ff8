use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_CONFIG: &str = "DOCSCAN_CONFIG";
pub const ENV_DATA_DIR: &str = "DOCSCAN_DATA_DIR";
pub const ENV_TESSERACT_CMD: &str = "DOCSCAN_TESSERACT_CMD";
pub const ENV_OCR_LANG: &str = "DOCSCAN_OCR_LANG";
pub const ENV_OCR_ENGINE: &str = "DOCSCAN_OCR_ENGINE";
pub const ENV_PDFTOPPM_CMD: &str = "DOCSCAN_PDFTOPPM_CMD";
pub const ENV_PDF_DPI: &str = "DOCSCAN_PDF_DPI";

const CONFIG_FILE: &str = "docscan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },
}

/// Which Tesseract integration recognizes text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    /// The `tesseract` executable, run once per page.
    #[default]
    Cli,
    /// libtesseract linked in-process; needs the `tesseract` build feature.
    Library,
}

impl std::str::FromStr for OcrEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "library" => Ok(Self::Library),
            other => Err(format!("unknown OCR engine '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub engine: OcrEngine,
    /// Tesseract executable; a bare name is looked up on `PATH`.
    pub tesseract_cmd: PathBuf,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngine::Cli,
            tesseract_cmd: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub pdftoppm_cmd: PathBuf,
    pub dpi: u32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { pdftoppm_cmd: PathBuf::from("pdftoppm"), dpi: 200 }
    }
}

/// Process-wide settings, resolved once at startup.
///
/// Precedence is defaults, then the TOML file, then environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub recent_limit: u32,
    pub ocr: OcrConfig,
    pub pdf: PdfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            recent_limit: 5,
            ocr: OcrConfig::default(),
            pdf: PdfConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "docscan", "docscan")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Config {
    /// Resolve from the real process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an injected environment lookup.
    pub fn resolve_with<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = match env(ENV_CONFIG) {
            Some(p) => PathBuf::from(p),
            None => env(ENV_DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir)
                .join(CONFIG_FILE),
        };

        let mut config = Self::from_file(&config_path)?.unwrap_or_default();
        config.apply_env(env)?;
        Ok(config)
    }

    /// Parse a config file. A missing file yields `Ok(None)`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
        };
        toml::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    fn apply_env<F>(&mut self, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = env(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env(ENV_TESSERACT_CMD) {
            self.ocr.tesseract_cmd = PathBuf::from(v);
        }
        if let Some(v) = env(ENV_OCR_LANG) {
            self.ocr.language = v;
        }
        if let Some(v) = env(ENV_OCR_ENGINE) {
            self.ocr.engine = v
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: ENV_OCR_ENGINE, value: v })?;
        }
        if let Some(v) = env(ENV_PDFTOPPM_CMD) {
            self.pdf.pdftoppm_cmd = PathBuf::from(v);
        }
        if let Some(v) = env(ENV_PDF_DPI) {
            self.pdf.dpi = match v.trim().parse::<u32>() {
                Ok(dpi) if dpi > 0 => dpi,
                _ => return Err(ConfigError::InvalidEnv { key: ENV_PDF_DPI, value: v }),
            };
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("docscan.db")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}
