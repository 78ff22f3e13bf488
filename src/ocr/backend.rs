//! OCR backend abstraction.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Render every page of `pdf_path` into `output_dir`, returning the
    /// images in page order.
    fn pdf_to_images(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError>;

    /// Run OCR on an image file.
    fn ocr_image(&self, image_path: &Path) -> Result<String, OcrError>;
}

/// Configuration for OCR backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract languages; Marathi plus English by default.
    pub language: String,
    /// Rasterisation resolution for PDF pages. 200 dpi keeps tesseract
    /// output in line with earlier extraction runs.
    pub dpi: u32,
    /// Explicit tesseract binary. Looked up in PATH when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tesseract_path: Option<PathBuf>,
    /// Explicit pdftoppm binary. Looked up in PATH when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdftoppm_path: Option<PathBuf>,
    /// Default start phrase for `extract`.
    pub start_phrase: String,
    /// Default end phrase for `extract`.
    pub end_phrase: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "mar+eng".to_string(),
            dpi: 200,
            tesseract_path: None,
            pdftoppm_path: None,
            start_phrase: "First Information contents".to_string(),
            end_phrase: "Action taken: Since the above information reveals commission of offence"
                .to_string(),
        }
    }
}
