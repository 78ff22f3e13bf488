//! PDF to phrase-delimited text span.

use std::path::Path;
use std::time::Instant;

use tempfile::TempDir;
use tracing::{debug, info};

use super::backend::{OcrBackend, OcrError};
use super::cleanup::{clean_page_text, extract_between, join_pages};

/// Runs a scanned PDF through OCR and cuts out the span between two phrases.
pub struct PhraseExtractor {
    backend: Box<dyn OcrBackend>,
}

impl PhraseExtractor {
    pub fn new(backend: Box<dyn OcrBackend>) -> Self {
        Self { backend }
    }

    /// OCR every page, strip boilerplate and join the pages.
    pub fn extract_text(&self, pdf_path: &Path) -> Result<String, OcrError> {
        if !self.backend.is_available() {
            return Err(OcrError::BackendNotAvailable(self.backend.availability_hint()));
        }

        let start = Instant::now();
        let temp_dir = TempDir::new()?;
        let images = self.backend.pdf_to_images(pdf_path, temp_dir.path())?;

        let mut pages = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            let raw = self.backend.ocr_image(image)?;
            debug!("Page {}: {} chars", i + 1, raw.chars().count());
            pages.push(clean_page_text(&raw));
        }

        info!(
            "OCR'd {} pages of {} with {} in {}ms",
            pages.len(),
            pdf_path.display(),
            self.backend.name(),
            start.elapsed().as_millis()
        );

        Ok(join_pages(pages))
    }

    /// Text from `start_phrase` up to `end_phrase`, or the not-found sentinel.
    pub fn extract_from_pdf(
        &self,
        pdf_path: &Path,
        start_phrase: &str,
        end_phrase: &str,
    ) -> Result<String, OcrError> {
        let full_text = self.extract_text(pdf_path)?;
        Ok(extract_between(&full_text, start_phrase, end_phrase))
    }
}
