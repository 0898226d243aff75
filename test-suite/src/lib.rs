//! Test Suite for pdf-swap
//!
//! Shared fixtures for the core and API crates: generated PDFs, deliberately
//! broken payloads, multipart bodies and helpers to inspect merged output.

pub mod generators;
pub mod inspect;
pub mod multipart;

pub use generators::{PdfVersion, TestPdfBuilder};
pub use multipart::MultipartBuilder;

/// Common test utilities
pub mod utils {
    use std::path::Path;

    /// Number of entries directly under `dir`, zero if it does not exist.
    pub fn entry_count<P: AsRef<Path>>(dir: P) -> usize {
        std::fs::read_dir(dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}
