//! firharvest - published FIR retrieval and OCR span extraction.
//!
//! Drives the search form of a police citizen portal through a browser,
//! lists the FIRs it returns and triggers their PDF downloads. Separately,
//! pulls a phrase-delimited span of text out of scanned FIR PDFs.

pub mod browser;
pub mod cli;
pub mod config;
pub mod ocr;
pub mod portal;
