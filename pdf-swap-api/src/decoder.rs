//! Multipart request decoding
//!
//! Turns the form parts of one request into a [`SwapRequest`], staging every
//! uploaded file in the request's [`WorkingArea`] as it arrives.

use crate::error::ApiError;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use pdf_swap::request::{
    summarize_files, ANNEXE_FIELD, NUMBERED_FIELD, PARAMS_FIELD, PRINCIPAL_FIELD,
};
use pdf_swap::{StampFields, SwapError, SwapParams, SwapRequest, UploadedFile, WorkingArea};

const FONT_SIZE_FIELD: &str = "font_size";
const POS_X_FIELD: &str = "pos_x";
const POS_Y_FIELD: &str = "pos_y";

/// Decode a swap request.
///
/// Unknown parts are skipped. Checks that need the whole body (missing
/// `params`, missing `principal`, `params` syntax) run after the last part.
pub async fn decode(mut multipart: Multipart, area: &WorkingArea) -> Result<SwapRequest, ApiError> {
    let mut params: Option<Vec<u8>> = None;
    let mut principal: Option<UploadedFile> = None;
    let mut annexes = Vec::new();
    let mut stamp = StampFields::default();
    // (field, filename) of every file part, in arrival order
    let mut received: Vec<(String, String)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);

        match name.as_str() {
            PARAMS_FIELD => {
                if filename.as_deref() == Some("") {
                    return Err(empty_filename(&name));
                }
                if params.is_some() {
                    return Err(SwapError::invalid_usage(format!(
                        "JSON data for field \"{PARAMS_FIELD}\" was sent more than once"
                    ))
                    .into());
                }
                let bytes = field.bytes().await.map_err(malformed)?;
                area.stage(filename.as_deref().unwrap_or(PARAMS_FIELD), &bytes)?;
                if let Some(filename) = filename {
                    received.push((name.clone(), filename));
                }
                params = Some(bytes.to_vec());
            }
            PRINCIPAL_FIELD | ANNEXE_FIELD => {
                let filename = match filename {
                    Some(filename) if !filename.is_empty() => filename,
                    _ => return Err(empty_filename(&name)),
                };
                received.push((name.clone(), filename.clone()));

                if name == PRINCIPAL_FIELD && principal.is_some() {
                    return Err(SwapError::invalid_usage(format!(
                        "\"{PRINCIPAL_FIELD}\" key was sent more than once in request files ({})",
                        summary(&received)
                    ))
                    .into());
                }

                let content = field.bytes().await.map_err(malformed)?.to_vec();
                tracing::debug!(field = %name, filename = %filename, bytes = content.len(), "file part received");
                let file = UploadedFile::staged(area, name.as_str(), filename, content)?;
                if name == PRINCIPAL_FIELD {
                    principal = Some(file);
                } else {
                    annexes.push(file);
                }
            }
            FONT_SIZE_FIELD => stamp.font_size = Some(text(field).await?),
            POS_X_FIELD => stamp.pos_x = Some(text(field).await?),
            POS_Y_FIELD => stamp.pos_y = Some(text(field).await?),
            NUMBERED_FIELD => stamp.numbered = Some(text(field).await?),
            _ => tracing::debug!(field = %name, "ignoring unknown form field"),
        }
    }

    let params = params.ok_or_else(|| {
        SwapError::invalid_usage(format!(
            "JSON data for field \"{PARAMS_FIELD}\" was not provided"
        ))
    })?;
    let principal = principal.ok_or_else(|| {
        SwapError::invalid_usage(format!(
            "\"{PRINCIPAL_FIELD}\" key is not in request files ({})",
            summary(&received)
        ))
    })?;
    let params = SwapParams::from_slice(&params)?;

    tracing::debug!(
        annexes = annexes.len(),
        declared = params.annexes.len(),
        "multipart request decoded"
    );

    Ok(SwapRequest::new(params, principal, annexes).with_stamp_fields(stamp))
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(malformed)
}

fn summary(received: &[(String, String)]) -> String {
    summarize_files(
        received
            .iter()
            .map(|(field, filename)| (field.as_str(), filename.as_str())),
    )
}

fn empty_filename(field: &str) -> ApiError {
    SwapError::invalid_usage(format!("Empty file name for field \"{field}\"")).into()
}

fn malformed(error: MultipartError) -> ApiError {
    ApiError::Multipart(error.body_text())
}
