//! The swap pipeline: validate, locate, assemble

use crate::assembler::{AnnexState, PdfAssembler};
use crate::cancel::{self, CancellationToken};
use crate::error::SwapResult;
use crate::locator::PatternLocator;
use crate::pdf;
use crate::request::{ResultDocument, SwapRequest};
use crate::validator::validate;
use std::time::Instant;

/// Runs a [`SwapRequest`] to completion.
///
/// Blocking; callers on an async runtime run it on a blocking thread and
/// cancel through the token passed to [`PdfSwapper::with_cancel`].
#[derive(Debug, Clone, Default)]
pub struct PdfSwapper {
    cancel: CancellationToken,
}

impl PdfSwapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn swap(&self, request: &SwapRequest) -> SwapResult<ResultDocument> {
        let started = Instant::now();
        cancel::check(&self.cancel)?;

        let plan = validate(request)?;
        cancel::check(&self.cancel)?;

        let principal = pdf::load_principal(&plan.principal.content)?;
        tracing::debug!(
            annexes = plan.annexes.len(),
            state = ?AnnexState::Locating,
            "locating patterns"
        );
        let matches = PatternLocator::from_document(&principal)?.locate(&plan.annexes)?;
        cancel::check(&self.cancel)?;

        let result = PdfAssembler::new(plan.assembly_options())
            .with_cancel(self.cancel.clone())
            .assemble(principal, &plan.annexes, &matches)?;

        tracing::info!(
            annexes = plan.annexes.len(),
            pages = result.page_count,
            bytes = result.bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "swap completed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwapError;
    use crate::request::{SwapParams, UploadedFile};
    use crate::working_area::WorkingArea;
    use pdf_swap_test_suite::generators::TestPdfBuilder;

    #[test]
    fn test_cancelled_before_start() {
        let area = WorkingArea::acquire().unwrap();
        let principal = TestPdfBuilder::new().page(&["only"]).build();
        let request = SwapRequest::new(
            SwapParams::from_json(r#"{"annexes":[]}"#).unwrap(),
            UploadedFile::staged(&area, "principal", "main.pdf", principal).unwrap(),
            vec![],
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = PdfSwapper::new().with_cancel(cancel).swap(&request).unwrap_err();
        assert_eq!(error, SwapError::Cancelled);
    }

    #[test]
    fn test_missing_pattern_is_server_error() {
        let area = WorkingArea::acquire().unwrap();
        let principal = TestPdfBuilder::new().page(&["nothing here"]).build();
        let annex = TestPdfBuilder::new().page(&["annex"]).build();
        let request = SwapRequest::new(
            SwapParams::from_json(r#"{"annexes":[{"name":"a.pdf","pattern":"PDF_1"}]}"#).unwrap(),
            UploadedFile::staged(&area, "principal", "main.pdf", principal).unwrap(),
            vec![UploadedFile::staged(&area, "annexe", "a.pdf", annex).unwrap()],
        );

        let error = PdfSwapper::new().swap(&request).unwrap_err();
        assert_eq!(
            error,
            SwapError::InternalError("Error locating pattern \"PDF_1\" for annexe \"a.pdf\"".into())
        );
    }
}
