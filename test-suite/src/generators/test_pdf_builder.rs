//! Test PDF Builder
//!
//! A builder for creating test PDFs whose pages carry known lines of text.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// PDF version to generate
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PdfVersion {
    V1_4,
    V1_5,
    V1_7,
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = match self {
            PdfVersion::V1_4 => "1.4",
            PdfVersion::V1_5 => "1.5",
            PdfVersion::V1_7 => "1.7",
        };
        write!(f, "{version}")
    }
}

/// Builder for creating test PDFs
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    version: PdfVersion,
    pages: Vec<Vec<String>>,
    info: Vec<(String, String)>,
    media_box: [i64; 4],
    crop_box: Option<[i64; 4]>,
    nested: bool,
    compress_streams: bool,
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPdfBuilder {
    /// Create a new PDF builder with default settings
    pub fn new() -> Self {
        Self {
            version: PdfVersion::V1_4,
            pages: Vec::new(),
            info: Vec::new(),
            media_box: [0, 0, 595, 842],
            crop_box: None,
            nested: false,
            compress_streams: false,
        }
    }

    /// Set PDF version
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Add document info
    pub fn with_info(mut self, key: &str, value: &str) -> Self {
        self.info.push((key.to_string(), value.to_string()));
        self
    }

    /// Add title
    pub fn with_title(self, title: &str) -> Self {
        self.with_info("Title", title)
    }

    pub fn with_media_box(mut self, media_box: [i64; 4]) -> Self {
        self.media_box = media_box;
        self
    }

    /// Crop every page; inherited from the intermediate node when nested.
    pub fn with_crop_box(mut self, crop_box: [i64; 4]) -> Self {
        self.crop_box = Some(crop_box);
        self
    }

    /// Put pages under an intermediate node that holds their Resources and
    /// MediaBox, so pages only get them by inheritance.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Flate-compress page content streams
    pub fn compressed(mut self) -> Self {
        self.compress_streams = true;
        self
    }

    /// Add a page showing one text line per entry
    pub fn page(mut self, lines: &[&str]) -> Self {
        self.pages.push(lines.iter().map(|line| line.to_string()).collect());
        self
    }

    /// Add `count` pages labelled `"{tag} page {n}"`
    pub fn pages(mut self, tag: &str, count: usize) -> Self {
        for n in 1..=count {
            self.pages.push(vec![format!("{tag} page {n}")]);
        }
        self
    }

    /// Build the PDF
    ///
    /// # Panics
    ///
    /// If serialization fails, which only happens on a builder bug.
    pub fn build(&self) -> Vec<u8> {
        self.try_build().expect("test PDF generation failed")
    }

    pub fn try_build(&self) -> Result<Vec<u8>> {
        let mut doc = Document::with_version(self.version.to_string());
        let root_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let media_box: Vec<Object> = self.media_box.iter().map(|v| (*v).into()).collect();
        let crop_box: Option<Vec<Object>> = self
            .crop_box
            .map(|crop| crop.iter().map(|v| (*v).into()).collect());

        let parent_id = if self.nested {
            doc.new_object_id()
        } else {
            root_id
        };

        let mut kids = Vec::with_capacity(self.pages.len());
        for lines in &self.pages {
            let mut stream = Stream::new(Dictionary::new(), self.page_content(lines).encode()?);
            if self.compress_streams {
                stream.compress()?;
            }
            let content_id = doc.add_object(stream);

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => parent_id,
                "Contents" => content_id,
            };
            if !self.nested {
                page.set("Resources", resources_id);
                page.set("MediaBox", media_box.clone());
                if let Some(crop_box) = &crop_box {
                    page.set("CropBox", crop_box.clone());
                }
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let count = kids.len() as i64;
        if self.nested {
            let mut node = dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            };
            if let Some(crop_box) = crop_box {
                node.set("CropBox", crop_box);
            }
            doc.objects.insert(parent_id, Object::Dictionary(node));
            doc.objects.insert(
                root_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Kids" => vec![Object::Reference(parent_id)],
                    "Count" => count,
                }),
            );
        } else {
            doc.objects.insert(
                root_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Pages",
                    "Kids" => kids,
                    "Count" => count,
                }),
            );
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => root_id,
        });
        doc.trailer.set("Root", catalog_id);

        if !self.info.is_empty() {
            let mut info = Dictionary::new();
            for (key, value) in &self.info {
                info.set(key.as_str(), Object::string_literal(value.as_str()));
            }
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn page_content(&self, lines: &[String]) -> Content {
        let [left, _, _, top] = self.crop_box.unwrap_or(self.media_box);
        let (left, top) = (left + 72, top - 72);
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![left.into(), top.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
            }
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.as_str())],
            ));
        }
        operations.push(Operation::new("ET", vec![]));
        Content { operations }
    }
}
