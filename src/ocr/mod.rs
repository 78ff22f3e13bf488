//! OCR span extraction for scanned FIR PDFs.
//!
//! - pdftoppm (Poppler) renders each PDF page to an image
//! - Tesseract reads each image with Marathi + English models
//! - Known form boilerplate is stripped per page
//! - The text between two caller phrases is returned
//!
//! This pipeline is independent of the portal scraper.

mod backend;
mod cleanup;
mod extractor;
mod tesseract;

pub use backend::{OcrBackend, OcrConfig, OcrError};
pub use cleanup::{clean_page_text, extract_between, join_pages, NOT_FOUND};
pub use extractor::PhraseExtractor;
pub use tesseract::{collect_page_images, TesseractBackend};
