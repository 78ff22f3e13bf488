//! Tesseract OCR backend implementation.
//!
//! Rasterises PDFs with `pdftoppm` (Poppler) and reads the page images with
//! the `tesseract` command-line tool.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::backend::{OcrBackend, OcrConfig, OcrError};

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    fn tesseract_cmd(&self) -> &OsStr {
        self.config
            .tesseract_path
            .as_deref()
            .map(Path::as_os_str)
            .unwrap_or_else(|| OsStr::new("tesseract"))
    }

    fn pdftoppm_cmd(&self) -> &OsStr {
        self.config
            .pdftoppm_path
            .as_deref()
            .map(Path::as_os_str)
            .unwrap_or_else(|| OsStr::new("pdftoppm"))
    }

    /// Availability of each external tool this backend runs.
    pub fn check_tools(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("tesseract", binary_available(self.tesseract_cmd())),
            ("pdftoppm", binary_available(self.pdftoppm_cmd())),
        ]
    }

    /// Run Tesseract on an image file.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, OcrError> {
        let output = Command::new(self.tesseract_cmd())
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "tesseract not found (install tesseract-ocr)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Page images written by `pdftoppm` for `prefix`, ordered by page number.
///
/// pdftoppm pads page numbers to the width of the last page (page-1.png,
/// page-01.png, page-001.png), so ordering is numeric, not lexical.
pub fn collect_page_images(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, OcrError> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let Some(number) = stem
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|n| n.parse::<u32>().ok())
        else {
            continue;
        };
        pages.push((number, path));
    }
    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, p)| p).collect())
}

fn binary_available(cmd: &OsStr) -> bool {
    let path = Path::new(cmd);
    if path.components().count() > 1 {
        return path.exists();
    }
    which::which(cmd).is_ok()
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        binary_available(self.tesseract_cmd()) && binary_available(self.pdftoppm_cmd())
    }

    fn availability_hint(&self) -> String {
        if !binary_available(self.tesseract_cmd()) {
            "Tesseract not installed. Install with: apt install tesseract-ocr tesseract-ocr-mar"
                .to_string()
        } else if !binary_available(self.pdftoppm_cmd()) {
            "pdftoppm not installed. Install with: apt install poppler-utils".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn pdf_to_images(&self, pdf_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let output_prefix = output_dir.join("page");
        let dpi = self.config.dpi.to_string();

        let status = Command::new(self.pdftoppm_cmd())
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(&output_prefix)
            .status();

        match status {
            Ok(s) if s.success() => {
                let pages = collect_page_images(output_dir, "page")?;
                if pages.is_empty() {
                    return Err(OcrError::OcrFailed(format!(
                        "No page images generated for {}",
                        pdf_path.display()
                    )));
                }
                debug!("Rendered {} pages from {}", pages.len(), pdf_path.display());
                Ok(pages)
            }
            Ok(_) => Err(OcrError::OcrFailed(
                "pdftoppm failed to convert PDF".to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(
                    "pdftoppm not found (install poppler-utils)".to_string(),
                ))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String, OcrError> {
        self.run_tesseract(image_path)
    }
}
