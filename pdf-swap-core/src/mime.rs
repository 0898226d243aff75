//! Content-based MIME detection
//!
//! Uploads are classified by their leading bytes, never by filename. Only the
//! PDF verdict matters for the swap itself; the other types exist so error
//! messages can say what was sent instead.

use infer::MatcherType;

pub const PDF_MIME: &str = "application/pdf";

/// Readers accept a header preceded by junk up to this many bytes.
const PDF_HEADER_WINDOW: usize = 1024;

/// How much of a text upload is inspected for source-code markers
const TEXT_SNIFF_WINDOW: usize = 4096;

const PYTHON_MARKERS: &[&str] = &[
    "# -*- coding",
    "import ",
    "from ",
    "def ",
    "class ",
    "if __name__",
];

/// Sniff the MIME type of `bytes`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.is_empty() {
        return "application/x-empty";
    }

    // `infer` text kinds only see a shebang or a leading tag; refined below
    let detected = infer::get(bytes);
    if let Some(kind) = &detected {
        if !matches!(kind.matcher_type(), MatcherType::Text) {
            return kind.mime_type();
        }
    }

    if has_pdf_header(bytes) {
        return PDF_MIME;
    }

    let head = &bytes[..bytes.len().min(TEXT_SNIFF_WINDOW)];
    let Some(text) = as_text(head) else {
        return "application/octet-stream";
    };

    if let Some(interpreter) = text.strip_prefix("#!") {
        let interpreter = interpreter.lines().next().unwrap_or_default();
        if interpreter.contains("python") {
            return "text/x-python";
        }
        return "text/x-shellscript";
    }

    let trimmed = text.trim_start();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_slice::<serde_json::Value>(bytes).is_ok()
    {
        return "application/json";
    }

    if looks_like_python(text) {
        return "text/x-python";
    }

    detected.as_ref().map_or("text/plain", |kind| kind.mime_type())
}

/// `%PDF-` preceded by junk, which `infer` only accepts at offset 0
fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Decode `head` as text, tolerating a UTF-8 sequence cut by the window.
fn as_text(head: &[u8]) -> Option<&str> {
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            // Truncated multi-byte sequence at the window edge
            std::str::from_utf8(&head[..e.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };

    let binary = text
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\x0c'));
    (!binary).then_some(text)
}

fn looks_like_python(text: &str) -> bool {
    let hits = text
        .lines()
        .filter(|line| PYTHON_MARKERS.iter().any(|marker| line.starts_with(marker)))
        .count();
    hits >= 2 || text.starts_with("# -*- coding")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert_eq!(sniff_mime(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj"), PDF_MIME);
        assert_eq!(sniff_mime(b"\r\n%PDF-1.4\n"), PDF_MIME);
        assert_eq!(sniff_mime(b"garbage\n%PDF-1.4\n"), PDF_MIME);
    }

    #[test]
    fn test_pdf_header_outside_window() {
        let mut bytes = vec![b' '; PDF_HEADER_WINDOW];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        assert_ne!(sniff_mime(&bytes), PDF_MIME);
    }

    #[test]
    fn test_extension_is_irrelevant() {
        // What a client would upload as "main.pdf" by mistake
        let script = b"# -*- coding: utf-8 -*-\n\"\"\"\ndocstring\n\"\"\"\nimport re\n";
        assert_eq!(sniff_mime(script), "text/x-python");
    }

    #[test]
    fn test_script_detection() {
        assert_eq!(sniff_mime(b"#!/usr/bin/env python3\nprint(1)\n"), "text/x-python");
        assert_eq!(sniff_mime(b"#!/bin/sh\necho hi\n"), "text/x-shellscript");
        assert_eq!(
            sniff_mime(b"import os\nimport sys\n\nprint(os.getcwd())\n"),
            "text/x-python"
        );
    }

    #[test]
    fn test_other_types() {
        assert_eq!(sniff_mime(b""), "application/x-empty");
        assert_eq!(sniff_mime(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff_mime(b"\xff\xd8\xff\xe0\0\x10JFIF"), "image/jpeg");
        assert_eq!(sniff_mime(b"PK\x03\x04\x14\0"), "application/zip");
        assert_eq!(sniff_mime(b"GIF89a\x01\0\x01\0"), "image/gif");
        assert_eq!(sniff_mime(b"\x1f\x8b\x08\0\0\0\0\0"), "application/gzip");
        assert_eq!(sniff_mime(br#"{"annexes": []}"#), "application/json");
        assert_eq!(sniff_mime(b"just some words\n"), "text/plain");
        assert_eq!(sniff_mime(b"\0\x01\x02\x03binary"), "application/octet-stream");
    }

    #[test]
    fn test_truncated_utf8_at_window_edge() {
        let mut bytes = vec![b'a'; TEXT_SNIFF_WINDOW - 1];
        bytes.extend_from_slice("é".as_bytes());
        assert_eq!(sniff_mime(&bytes), "text/plain");
    }
}
