//! Invalid PDF Generators
//!
//! Payloads that must be rejected, either by content sniffing or when the
//! swap pipeline tries to open them.

/// Cut a valid PDF in half: the header survives but the xref and trailer do not.
pub fn truncated(valid: &[u8]) -> Vec<u8> {
    valid[..valid.len() / 2].to_vec()
}

/// A small Python script that must sniff as `text/x-python`
pub fn python_script() -> Vec<u8> {
    b"# -*- coding: utf-8 -*-\n\
      import os\n\
      import sys\n\
      \n\
      def main():\n\
      \x20   print(os.getcwd())\n\
      \n\
      if __name__ == '__main__':\n\
      \x20   main()\n"
        .to_vec()
}

/// Plain prose that must sniff as `text/plain`
pub fn plain_text() -> Vec<u8> {
    b"This is a short text document.\nIt is not a PDF.\n".to_vec()
}

/// PNG signature followed by a few bytes
pub fn png_image() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestPdfBuilder;

    #[test]
    fn test_invalid_payloads_do_not_load() {
        let valid = TestPdfBuilder::new().page(&["x"]).build();
        assert!(lopdf::Document::load_mem(&valid).is_ok());
        assert!(lopdf::Document::load_mem(&truncated(&valid)).is_err());
        assert!(lopdf::Document::load_mem(&python_script()).is_err());
    }
}
