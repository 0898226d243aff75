//! Input validation
//!
//! Everything that can be decided without opening a PDF is decided here, so a
//! bad request is rejected before any parsing work starts.

use crate::assembler::AssemblyOptions;
use crate::error::{SwapError, SwapResult};
use crate::mime::{sniff_mime, PDF_MIME};
use crate::request::{
    Annex, StampFields, StampOptions, SwapRequest, UploadedFile, ANNEXE_FIELD, NUMBERED_FIELD,
    PRINCIPAL_FIELD,
};
use std::collections::HashMap;
use std::path::Path;

/// A request that passed validation, with annexes in declared order
#[derive(Debug, Clone)]
pub struct SwapPlan<'a> {
    pub principal: &'a UploadedFile,
    pub annexes: Vec<Annex<'a>>,
    /// Annex name to staged file, built here rather than written into `params`
    pub staged: HashMap<&'a str, &'a Path>,
    pub number_annex_pages: bool,
    pub stamp: StampOptions,
}

impl SwapPlan<'_> {
    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            number_annex_pages: self.number_annex_pages,
            stamp: self.stamp,
        }
    }
}

/// Validate a decoded request.
pub fn validate(request: &SwapRequest) -> SwapResult<SwapPlan<'_>> {
    check_pdf(&request.principal, "Main", PRINCIPAL_FIELD)?;

    let files = index_annex_files(request)?;
    for file in &request.annexes {
        check_pdf(file, "Annexe", ANNEXE_FIELD)?;
    }

    let annexes = resolve_annexes(request, &files)?;
    let staged = annexes.iter().map(|a| (a.name, a.path)).collect();

    let stamp = stamp_options(&request.stamp_fields)?;
    let number_annex_pages = match request.params.with_annexes_pages_numbered {
        Some(flag) => flag,
        None => parse_flag(NUMBERED_FIELD, request.stamp_fields.numbered.as_deref())?,
    };

    tracing::debug!(
        annexes = annexes.len(),
        number_annex_pages,
        "request validated"
    );

    Ok(SwapPlan {
        principal: &request.principal,
        annexes,
        staged,
        number_annex_pages,
        stamp,
    })
}

fn check_pdf(file: &UploadedFile, label: &str, field: &str) -> SwapResult<()> {
    let mime = sniff_mime(&file.content);
    if mime == PDF_MIME {
        return Ok(());
    }
    Err(SwapError::invalid_usage(format!(
        "{label} PDF document \"{field}\" MIME type is not \"{PDF_MIME}\" \
         (found \"{mime}\" MIME type for \"{}\")",
        file.filename
    )))
}

fn index_annex_files(request: &SwapRequest) -> SwapResult<HashMap<&str, &UploadedFile>> {
    let mut files = HashMap::with_capacity(request.annexes.len());
    for (position, file) in request.annexes.iter().enumerate() {
        if files.insert(file.filename.as_str(), file).is_some() {
            return Err(SwapError::invalid_usage(format!(
                "\"{ANNEXE_FIELD}\"[{}] file name \"{}\" was already sent in request files ({})",
                position + 1,
                file.filename,
                request.file_summary()
            )));
        }
    }
    Ok(files)
}

fn resolve_annexes<'a>(
    request: &'a SwapRequest,
    files: &HashMap<&str, &'a UploadedFile>,
) -> SwapResult<Vec<Annex<'a>>> {
    let mut annexes = Vec::with_capacity(request.params.annexes.len());
    // pattern -> first annex name that used it
    let mut patterns: HashMap<&str, &str> = HashMap::new();

    for (position, entry) in request.params.annexes.iter().enumerate() {
        for (key, value) in [("name", &entry.name), ("pattern", &entry.pattern)] {
            if value.is_empty() {
                return Err(SwapError::invalid_usage(format!(
                    "Annexe entry {} in \"params\" JSON data has an empty \"{key}\"",
                    position + 1
                )));
            }
        }

        if annexes.iter().any(|a: &Annex<'_>| a.name == entry.name) {
            return Err(SwapError::invalid_usage(format!(
                "File name \"{}\" is referenced more than once in \"params\" JSON data",
                entry.name
            )));
        }

        let file = files.get(entry.name.as_str()).copied().ok_or_else(|| {
            SwapError::invalid_usage(format!(
                "File name \"{}\" present in \"params\" JSON data but not in \"{ANNEXE_FIELD}\" files",
                entry.name
            ))
        })?;

        if let Some(first) = patterns.insert(&entry.pattern, &entry.name) {
            return Err(SwapError::invalid_usage(format!(
                "Non unique pattern \"{}\" found for file \"{}\" (already found for file \"{first}\")",
                entry.pattern, entry.name
            )));
        }

        annexes.push(Annex {
            name: &entry.name,
            pattern: &entry.pattern,
            content: &file.content,
            path: &file.path,
        });
    }

    Ok(annexes)
}

fn stamp_options(fields: &StampFields) -> SwapResult<StampOptions> {
    let mut options = StampOptions::default();

    if let Some(raw) = fields.font_size.as_deref() {
        options.font_size = match raw.trim().parse::<u32>() {
            Ok(size) if size > 0 => size,
            _ => {
                return Err(SwapError::invalid_usage(format!(
                    "Expected positive non-zero integer value for field \"font_size\" but got \"{raw}\""
                )))
            }
        };
    }

    options.pos_x = parse_position("pos_x", fields.pos_x.as_deref())?;
    options.pos_y = parse_position("pos_y", fields.pos_y.as_deref())?;
    Ok(options)
}

fn parse_position(field: &str, raw: Option<&str>) -> SwapResult<Option<u32>> {
    raw.map(|raw| {
        raw.trim().parse::<u32>().map_err(|_| {
            SwapError::invalid_usage(format!(
                "Expected positive integer value for field \"{field}\" but got \"{raw}\""
            ))
        })
    })
    .transpose()
}

fn parse_flag(field: &str, raw: Option<&str>) -> SwapResult<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(SwapError::invalid_usage(format!(
            "Expected boolean value for field \"{field}\" but got \"{raw}\""
        ))),
    }
}
