//! Helpers to inspect generated and merged PDFs

use anyhow::{Context, Result};
use lopdf::Document;

pub fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).context("not a loadable PDF")
}

/// Page count of `bytes`; panics if it is not a loadable PDF.
pub fn page_count(bytes: &[u8]) -> usize {
    load(bytes).map(|doc| doc.get_pages().len()).unwrap_or_else(|e| panic!("{e:#}"))
}

/// Extracted text of every page, in order.
pub fn try_page_texts(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = load(bytes)?;
    doc.get_pages()
        .into_keys()
        .map(|number| {
            doc.extract_text(&[number])
                .with_context(|| format!("extracting text of page {number}"))
        })
        .collect()
}

/// Like [`try_page_texts`]; panics on any failure.
pub fn page_texts(bytes: &[u8]) -> Vec<String> {
    try_page_texts(bytes).unwrap_or_else(|e| panic!("{e:#}"))
}
