//! `multipart/form-data` request bodies
//!
//! Parts are written in call order with the same framing a browser uses, and
//! file content is copied as raw bytes.

pub const BOUNDARY: &str = "pdfswapboundary7MA4YWxkTrZu0gW";

#[derive(Debug, Clone, Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain text field
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(name, None, None);
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// A file field sent as `application/pdf`
    pub fn pdf(self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.file(name, filename, "application/pdf", content)
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, content: &[u8]) -> Self {
        self.open_part(name, Some(filename), Some(content_type));
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// The nominal `params` document, sent as a file like the reference client does
    pub fn params_file(self, json: &str) -> Self {
        self.file("params", "data.json", "application/json", json.as_bytes())
    }

    /// Value of the request `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    /// Close the body
    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }

    fn open_part(&mut self, name: &str, filename: Option<&str>, content_type: Option<&str>) {
        let mut head = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"");
        if let Some(filename) = filename {
            head.push_str(&format!("; filename=\"{filename}\""));
        }
        head.push_str("\r\n");
        if let Some(content_type) = content_type {
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        self.body.extend_from_slice(head.as_bytes());
    }
}
