//! Minimal PDF Generators
//!
//! The documents used by the end-to-end scenarios: a four page principal
//! anchoring `PDF_1` on page 2 and `PDF_2` on page 3, and three page annexes.

use super::test_pdf_builder::TestPdfBuilder;

pub const PRINCIPAL_PAGES: usize = 4;
pub const ANNEX_PAGES: usize = 3;

/// `params` document for the nominal two-annex case
pub const NOMINAL_PARAMS: &str = r#"{"annexes":[{"name":"pdf_1.pdf","pattern":"PDF_1"},{"name":"pdf_2.pdf","pattern":"PDF_2"}]}"#;

/// Principal with the `PDF_1` and `PDF_2` anchors
pub fn principal() -> Vec<u8> {
    TestPdfBuilder::new()
        .with_title("Principal")
        .page(&["Principal cover"])
        .page(&["Principal chapter", "PDF_1"])
        .page(&["Principal chapter", "PDF_2"])
        .page(&["Principal back cover"])
        .build()
}

/// A single-page document with `lines`
pub fn single_page(lines: &[&str]) -> Vec<u8> {
    TestPdfBuilder::new().page(lines).build()
}

/// An annex of [`ANNEX_PAGES`] pages labelled `"{tag} page {n}"`
pub fn annex(tag: &str) -> Vec<u8> {
    TestPdfBuilder::new().pages(tag, ANNEX_PAGES).build()
}
