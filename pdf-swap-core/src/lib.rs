//! # pdf-swap
//!
//! Assemble a single PDF from a principal document and a set of annex documents.
//! Each annex replaces the page of the principal that carries its anchor pattern.
//!
//! ## Pipeline
//!
//! - **Validation**: content sniffing, reference integrity and pattern uniqueness
//! - **Location**: find the first principal page whose text contains each pattern
//! - **Assembly**: splice annex pages in place of the anchor pages, optionally
//!   stamping `page / total` on every annex-sourced page
//! - **Working areas**: one scoped temporary directory per request, removed on drop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_swap::{PdfSwapper, SwapParams, SwapRequest, UploadedFile, WorkingArea};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let area = WorkingArea::acquire()?;
//! let params = SwapParams::from_json(
//!     r#"{"annexes":[{"name":"pdf_1.pdf","pattern":"PDF_1"}]}"#,
//! )?;
//!
//! let principal = std::fs::read("main.pdf")?;
//! let annex = std::fs::read("pdf_1.pdf")?;
//!
//! let request = SwapRequest::new(
//!     params,
//!     UploadedFile::staged(&area, "principal", "main.pdf", principal)?,
//!     vec![UploadedFile::staged(&area, "annexe", "pdf_1.pdf", annex)?],
//! );
//!
//! let result = PdfSwapper::new().swap(&request)?;
//! std::fs::write("result.pdf", &result.bytes)?;
//! area.release()?;
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod cancel;
pub mod error;
pub mod locator;
pub mod mime;
pub mod pdf;
pub mod request;
pub mod swap;
pub mod validator;
pub mod working_area;

pub use assembler::{assemble, AssemblyOptions, PdfAssembler};
pub use cancel::{CancellationToken, DropGuard};
pub use error::{ErrorKind, SwapError, SwapResult};
pub use locator::{locate, PatternLocator, PatternMatch};
pub use mime::{sniff_mime, PDF_MIME};
pub use request::{
    Annex, AnnexParams, ResultDocument, StampFields, StampOptions, SwapParams, SwapRequest,
    UploadedFile,
};
pub use swap::PdfSwapper;
pub use validator::{validate, SwapPlan};
pub use working_area::WorkingArea;

/// Current version of pdf-swap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
