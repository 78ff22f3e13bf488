//! OCR span extraction command.

use std::path::PathBuf;

use anyhow::Context;

use crate::config::Config;
use crate::ocr::{PhraseExtractor, TesseractBackend};

/// OCR `pdf` and print the text between the start and end phrases.
pub async fn cmd_extract(
    config: &Config,
    pdf: PathBuf,
    start: Option<String>,
    end: Option<String>,
    lang: Option<String>,
    dpi: Option<u32>,
) -> anyhow::Result<()> {
    if !pdf.exists() {
        anyhow::bail!("PDF not found: {}", pdf.display());
    }

    let mut ocr = config.ocr.clone();
    if let Some(lang) = lang {
        ocr.language = lang;
    }
    if let Some(dpi) = dpi {
        ocr.dpi = dpi;
    }
    let start = start.unwrap_or_else(|| ocr.start_phrase.clone());
    let end = end.unwrap_or_else(|| ocr.end_phrase.clone());

    let extractor = PhraseExtractor::new(Box::new(TesseractBackend::with_config(ocr)));

    // pdftoppm and tesseract are blocking subprocesses
    let text = tokio::task::spawn_blocking(move || extractor.extract_from_pdf(&pdf, &start, &end))
        .await
        .context("OCR task failed")?
        .context("OCR extraction failed")?;

    println!("{}", text);
    Ok(())
}
