//! Boilerplate removal and phrase-delimited span extraction for OCR text.
//!
//! Published FIR PDFs are the NCRB Integrated Investigation Form (I.I.F.-1),
//! printed bilingually. Every page carries a page number and two footer
//! lines which end up in the middle of the narrative once pages are joined.

use std::sync::LazyLock;

use regex::Regex;

/// Returned by [`extract_between`] when the phrases cannot be located.
pub const NOT_FOUND: &str = "The specified phrases were not found in the document.";

/// Removal rules, applied in order. Each match is replaced with its paired
/// string.
static BOILERPLATE_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // A page number alone on its line
        (Regex::new(r"\n\s*\d+\s*\n").unwrap(), "\n"),
        // N.C.R.B footer line
        (Regex::new(r"N\.C\.R\.B \(एन\.सी\.आर\.बी\).*").unwrap(), ""),
        // I.I.F.-1 footer line
        (
            Regex::new(r"I\.I\.F\.-1 \(एकीकृत अन् वेषणफॉर्म - १\).*").unwrap(),
            "",
        ),
        // Inline form name
        (
            Regex::new(r"I\.I\.F\.-1 \(एकीकृत अन् वेषणफॉर्म - १\)").unwrap(),
            "",
        ),
        // Form name as tesseract commonly misreads it
        (
            Regex::new(r"1\.1\.ए\.-\[ \(एकीकृत अन वेषणफॉर्म - १\)").unwrap(),
            "",
        ),
        (
            Regex::new(r"1\.1\.ए\.-\[ \(एकीकृत अन् वेषणफॉर्म - १\)").unwrap(),
            "",
        ),
    ]
});

/// Strip page numbers and form footers from one page of OCR output.
pub fn clean_page_text(page_text: &str) -> String {
    BOILERPLATE_RULES
        .iter()
        .fold(page_text.to_string(), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        })
}

/// Join cleaned pages, each followed by a single space.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut full_text = String::new();
    for page in pages {
        full_text.push_str(page.as_ref());
        full_text.push(' ');
    }
    full_text
}

/// Text from the first `start` up to, not including, the nearest following
/// `end`, with `start` itself kept. Spans line breaks.
///
/// Returns [`NOT_FOUND`] unless both phrases occur in that order.
pub fn extract_between(text: &str, start: &str, end: &str) -> String {
    let pattern = format!("(?s){}(.*?){}", regex::escape(start), regex::escape(end));
    let Ok(re) = Regex::new(&pattern) else {
        return NOT_FOUND.to_string();
    };

    match re.captures(text).and_then(|caps| caps.get(1)) {
        Some(middle) => format!("{}{}", start, middle.as_str()),
        None => NOT_FOUND.to_string(),
    }
}
