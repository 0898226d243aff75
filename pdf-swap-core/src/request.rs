//! Request data model
//!
//! A [`SwapRequest`] is what the transport hands to the core: the parsed
//! `params` document plus every uploaded file, already staged in the request's
//! [`WorkingArea`]. Nothing here knows about HTTP.

use crate::error::{SwapError, SwapResult};
use crate::working_area::WorkingArea;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Form field carrying the JSON parameter document
pub const PARAMS_FIELD: &str = "params";
/// Form field carrying the principal PDF
pub const PRINCIPAL_FIELD: &str = "principal";
/// Form field carrying each annex PDF
pub const ANNEXE_FIELD: &str = "annexe";
/// Form field (and `params` key) enabling annex page numbering
pub const NUMBERED_FIELD: &str = "with_annexes_pages_numbered";

/// Filename suggested to the client for the merged document
pub const RESULT_FILENAME: &str = "result.pdf";

const INVALID_PARAMS: &str = "Invalid JSON provided for field \"params\"";

/// One entry of the `annexes` array in the parameter document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnexParams {
    /// Filename of the uploaded annex this entry refers to
    pub name: String,
    /// Literal text identifying the principal page to replace
    pub pattern: String,
    /// Properties the core does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `params` JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapParams {
    pub annexes: Vec<AnnexParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_annexes_pages_numbered: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SwapParams {
    /// Parse the parameter document.
    ///
    /// Syntax errors and schema errors are both client errors; only the latter
    /// carry a detail, since a syntax error detail would echo the upload.
    pub fn from_json(text: &str) -> SwapResult<Self> {
        Self::from_slice(text.as_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> SwapResult<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "params document is not JSON");
            SwapError::invalid_usage(INVALID_PARAMS)
        })?;

        if !value.is_object() {
            return Err(SwapError::invalid_usage(format!(
                "{INVALID_PARAMS} (expected a JSON object)"
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| SwapError::invalid_usage(format!("{INVALID_PARAMS} ({e})")))
    }
}

/// An uploaded file part, staged on disk under a generated name
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field the part was sent under
    pub field: String,
    /// Filename as sent by the client; metadata only, never used as a path
    pub filename: String,
    /// Location of the staged copy inside the working area
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Stage `content` in `area` and describe it.
    pub fn staged(
        area: &WorkingArea,
        field: impl Into<String>,
        filename: impl Into<String>,
        content: Vec<u8>,
    ) -> std::io::Result<Self> {
        let filename = filename.into();
        let path = area.stage(&filename, &content)?;
        Ok(Self {
            field: field.into(),
            filename,
            path,
            content,
        })
    }
}

/// Raw form text fields controlling the page-number stamp.
///
/// Kept as text so the validator can quote exactly what was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampFields {
    pub font_size: Option<String>,
    pub pos_x: Option<String>,
    pub pos_y: Option<String>,
    pub numbered: Option<String>,
}

/// Validated placement of the page-number stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StampOptions {
    pub font_size: u32,
    /// Label baseline start, in points from the left edge
    pub pos_x: Option<u32>,
    /// Label baseline, in points from the bottom edge
    pub pos_y: Option<u32>,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            font_size: 10,
            pos_x: None,
            pos_y: None,
        }
    }
}

/// A decoded swap request
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub params: SwapParams,
    pub principal: UploadedFile,
    /// Annex parts in the order they were received
    pub annexes: Vec<UploadedFile>,
    pub stamp_fields: StampFields,
}

impl SwapRequest {
    pub fn new(params: SwapParams, principal: UploadedFile, annexes: Vec<UploadedFile>) -> Self {
        Self {
            params,
            principal,
            annexes,
            stamp_fields: StampFields::default(),
        }
    }

    pub fn with_stamp_fields(mut self, fields: StampFields) -> Self {
        self.stamp_fields = fields;
        self
    }

    /// `field=filename` pairs for every file part, for diagnostics.
    pub fn file_summary(&self) -> String {
        summarize_files(
            std::iter::once(&self.principal)
                .chain(self.annexes.iter())
                .map(|file| (file.field.as_str(), file.filename.as_str())),
        )
    }
}

/// Render `field=filename` pairs joined by `, `.
pub fn summarize_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    files
        .into_iter()
        .map(|(field, filename)| format!("{field}={filename}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A validated annex, borrowing from its [`SwapRequest`]
#[derive(Debug, Clone, Copy)]
pub struct Annex<'a> {
    pub name: &'a str,
    pub pattern: &'a str,
    pub content: &'a [u8],
    pub path: &'a Path,
}

/// The merged PDF handed back to the client
#[derive(Debug, Clone)]
pub struct ResultDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl ResultDocument {
    pub const CONTENT_TYPE: &'static str = crate::mime::PDF_MIME;

    pub fn suggested_filename(&self) -> &'static str {
        RESULT_FILENAME
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.suggested_filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_params_minimal() {
        let params =
            SwapParams::from_json(r#"{"annexes":[{"name":"a.pdf","pattern":"A"}]}"#).unwrap();
        assert_eq!(params.annexes.len(), 1);
        assert_eq!(params.annexes[0].name, "a.pdf");
        assert_eq!(params.annexes[0].pattern, "A");
        assert_eq!(params.with_annexes_pages_numbered, None);
    }

    #[test]
    fn test_params_preserve_unknown_properties() {
        let params = SwapParams::from_json(
            r#"{"annexes":[{"name":"a.pdf","pattern":"A","comment":"x"}],"author":"me","with_annexes_pages_numbered":true}"#,
        )
        .unwrap();
        assert_eq!(params.with_annexes_pages_numbered, Some(true));
        assert_eq!(params.extra.get("author"), Some(&Value::from("me")));
        assert_eq!(params.annexes[0].extra.get("comment"), Some(&Value::from("x")));
    }

    #[test]
    fn test_params_syntax_error() {
        let error = SwapParams::from_json("# -*- coding: utf-8 -*-").unwrap_err();
        assert_eq!(
            error,
            SwapError::InvalidUsage("Invalid JSON provided for field \"params\"".into())
        );
    }

    #[test]
    fn test_params_schema_errors() {
        let error = SwapParams::from_json("[1, 2]").unwrap_err();
        assert!(error.to_string().ends_with("(expected a JSON object)"));

        let error = SwapParams::from_json(r#"{"annexes":[{"name":"a.pdf"}]}"#).unwrap_err();
        assert!(matches!(error, SwapError::InvalidUsage(_)));
        assert!(error.to_string().contains("pattern"));

        let error = SwapParams::from_json(r#"{}"#).unwrap_err();
        assert!(error.to_string().contains("annexes"));
    }

    #[test]
    fn test_result_document_headers() {
        let result = ResultDocument {
            bytes: b"%PDF-1.5".to_vec(),
            page_count: 1,
        };
        assert_eq!(ResultDocument::CONTENT_TYPE, "application/pdf");
        assert_eq!(result.content_disposition(), "attachment; filename=result.pdf");
    }

    #[test]
    fn test_summarize_files() {
        let summary = summarize_files([("params", "data.json"), ("annexe", "pdf_1.pdf")]);
        assert_eq!(summary, "params=data.json, annexe=pdf_1.pdf");
    }
}
