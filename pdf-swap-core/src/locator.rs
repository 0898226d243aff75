//! Pattern location
//!
//! Text is extracted once per principal page; every annex pattern is then a
//! plain substring search over those texts.

use crate::error::{SwapError, SwapResult};
use crate::pdf;
use crate::request::Annex;
use lopdf::Document;

/// The principal page an annex replaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub annex_name: String,
    /// Zero-based page index in the principal
    pub page_index: usize,
}

/// Searches the extracted text of a principal document
#[derive(Debug, Clone)]
pub struct PatternLocator {
    page_texts: Vec<String>,
}

impl PatternLocator {
    /// Parse `principal` and extract the text of each page.
    pub fn from_bytes(principal: &[u8]) -> SwapResult<Self> {
        let document = pdf::load_principal(principal)?;
        Self::from_document(&document)
    }

    pub fn from_document(document: &Document) -> SwapResult<Self> {
        let page_numbers: Vec<u32> = document.get_pages().into_keys().collect();
        let mut page_texts = Vec::with_capacity(page_numbers.len());

        for number in page_numbers {
            let text = document.extract_text(&[number]).map_err(|e| {
                SwapError::internal(format!(
                    "Error while opening principal (page {number}: {e})"
                ))
            })?;
            page_texts.push(text);
        }

        tracing::debug!(pages = page_texts.len(), "principal text extracted");
        Ok(Self { page_texts })
    }

    /// Build a locator over already extracted page texts.
    pub fn from_page_texts(page_texts: Vec<String>) -> Self {
        Self { page_texts }
    }

    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }

    /// Zero-based index of the first page containing `pattern` literally.
    pub fn find(&self, pattern: &str) -> Option<usize> {
        self.page_texts.iter().position(|text| text.contains(pattern))
    }

    /// Resolve every annex, in declared order.
    pub fn locate(&self, annexes: &[Annex<'_>]) -> SwapResult<Vec<PatternMatch>> {
        annexes
            .iter()
            .map(|annex| {
                let page_index = self.find(annex.pattern).ok_or_else(|| {
                    SwapError::internal(format!(
                        "Error locating pattern \"{}\" for annexe \"{}\"",
                        annex.pattern, annex.name
                    ))
                })?;
                tracing::debug!(
                    annexe = annex.name,
                    pattern = annex.pattern,
                    page = page_index + 1,
                    "pattern located"
                );
                Ok(PatternMatch {
                    annex_name: annex.name.to_string(),
                    page_index,
                })
            })
            .collect()
    }
}

/// Locate every annex pattern in `principal`.
pub fn locate(principal: &[u8], annexes: &[Annex<'_>]) -> SwapResult<Vec<PatternMatch>> {
    PatternLocator::from_bytes(principal)?.locate(annexes)
}
