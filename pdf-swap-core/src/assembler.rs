//! PDF assembly
//!
//! The principal and every annex are loaded as separate `lopdf` documents,
//! renumbered into disjoint object ranges and merged into one object table.
//! A fresh single-level page tree then lists the principal pages with each
//! anchor page replaced by the pages of its annex.
//!
//! Nothing is produced until the whole document has been written to memory.

use crate::cancel::{self, CancellationToken};
use crate::error::{SwapError, SwapResult};
use crate::locator::PatternMatch;
use crate::pdf;
use crate::request::{Annex, ResultDocument, StampOptions};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashSet};

/// Resource name of the page-number font, chosen to avoid clashing with annex fonts
const STAMP_FONT: &str = "SwapStampF1";

/// Distance of the default label position from the bottom and right edges
const STAMP_MARGIN: f32 = 20.0;

/// Average Helvetica glyph width as a fraction of the font size
const HELVETICA_AVG_WIDTH: f32 = 0.5;

/// Object types rebuilt from scratch or meaningless once documents are merged
const DROPPED_TYPES: [&str; 5] = ["Catalog", "Pages", "Outlines", "XRef", "ObjStm"];

/// Catalog entries pointing into the old page tree
const STALE_CATALOG_KEYS: [&[u8]; 4] = [b"Outlines", b"PageLabels", b"Dests", b"StructTreeRoot"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyOptions {
    /// Stamp `page / total` on every annex-sourced page
    pub number_annex_pages: bool,
    pub stamp: StampOptions,
}

/// Progress of one annex through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnexState {
    Locating,
    Splicing,
    Labelling,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOrigin {
    Principal,
    /// `number` is 1-based within the annex
    Annex { number: usize, total: usize },
}

#[derive(Debug, Clone, Copy)]
struct PlacedPage {
    id: ObjectId,
    origin: PageOrigin,
}

/// Splices annexes into a principal document
#[derive(Debug, Clone, Default)]
pub struct PdfAssembler {
    options: AssemblyOptions,
    cancel: CancellationToken,
}

impl PdfAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace each matched principal page with the pages of its annex.
    ///
    /// Matches are applied by ascending page index. Annexes anchored on the
    /// same page replace it together, in the order the matches were given.
    pub fn assemble(
        &self,
        mut principal: Document,
        annexes: &[Annex<'_>],
        matches: &[PatternMatch],
    ) -> SwapResult<ResultDocument> {
        pdf::flatten_inheritance(&mut principal);
        let principal_pages = pdf::page_ids(&principal);

        let mut ordered: Vec<&PatternMatch> = matches.iter().collect();
        ordered.sort_by_key(|m| m.page_index);

        let mut next_id = highest_id(&principal) + 1;
        let mut sources = vec![principal];
        let mut replacements: BTreeMap<usize, Vec<PlacedPage>> = BTreeMap::new();

        for m in ordered {
            cancel::check(&self.cancel)?;
            if m.page_index >= principal_pages.len() {
                return Err(SwapError::merge_library(format!(
                    "page index {} out of bounds (principal has {} pages)",
                    m.page_index,
                    principal_pages.len()
                )));
            }
            let annex = annexes
                .iter()
                .find(|a| a.name == m.annex_name)
                .ok_or_else(|| {
                    SwapError::merge_library(format!("no annexe named \"{}\"", m.annex_name))
                })?;

            tracing::debug!(
                annexe = annex.name,
                page = m.page_index + 1,
                state = ?AnnexState::Splicing,
                "splicing annexe"
            );

            let mut document = pdf::load_annex(annex.name, annex.content)?;
            document.renumber_objects_with(next_id);
            next_id = highest_id(&document) + 1;
            pdf::flatten_inheritance(&mut document);

            let ids = pdf::page_ids(&document);
            let total = ids.len();
            replacements
                .entry(m.page_index)
                .or_default()
                .extend(ids.into_iter().enumerate().map(|(i, id)| PlacedPage {
                    id,
                    origin: PageOrigin::Annex {
                        number: i + 1,
                        total,
                    },
                }));
            sources.push(document);
        }

        let mut sequence = Vec::with_capacity(principal_pages.len());
        for (index, id) in principal_pages.into_iter().enumerate() {
            match replacements.remove(&index) {
                Some(pages) => sequence.extend(pages),
                None => sequence.push(PlacedPage {
                    id,
                    origin: PageOrigin::Principal,
                }),
            }
        }

        cancel::check(&self.cancel)?;
        let mut document = combine(sources, &sequence, next_id)?;

        if self.options.number_annex_pages {
            tracing::debug!(state = ?AnnexState::Labelling, "numbering annexe pages");
            self.label_annex_pages(&mut document, &sequence)?;
        }

        document.prune_objects();
        document.renumber_objects();
        document.compress();

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .map_err(SwapError::merge_library)?;

        tracing::debug!(
            pages = sequence.len(),
            bytes = bytes.len(),
            state = ?AnnexState::Done,
            "assembly complete"
        );

        Ok(ResultDocument {
            bytes,
            page_count: sequence.len(),
        })
    }

    fn label_annex_pages(&self, document: &mut Document, sequence: &[PlacedPage]) -> SwapResult<()> {
        let font_id = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        for placed in sequence {
            if let PageOrigin::Annex { number, total } = placed.origin {
                cancel::check(&self.cancel)?;
                let label = format!("{number} / {total}");
                stamp_page(document, placed.id, font_id, &label, &self.options.stamp)?;
            }
        }
        Ok(())
    }
}

/// Assemble with default stamp placement.
pub fn assemble(
    principal: &[u8],
    annexes: &[Annex<'_>],
    matches: &[PatternMatch],
    number_annex_pages: bool,
) -> SwapResult<ResultDocument> {
    let document = pdf::load_principal(principal)?;
    PdfAssembler::new(AssemblyOptions {
        number_annex_pages,
        ..Default::default()
    })
    .assemble(document, annexes, matches)
}

fn highest_id(document: &Document) -> u32 {
    let highest_key = document
        .objects
        .keys()
        .map(|(number, _)| *number)
        .max()
        .unwrap_or(0);
    highest_key.max(document.max_id)
}

/// Merge the object tables of `sources` (principal first) under a new page tree.
fn combine(sources: Vec<Document>, sequence: &[PlacedPage], next_id: u32) -> SwapResult<Document> {
    let mut sources = sources.into_iter();
    let principal = sources
        .next()
        .ok_or_else(|| SwapError::merge_library("no principal document"))?;

    let catalog_id = principal
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(SwapError::merge_library)?;
    let mut catalog = principal
        .get_dictionary(catalog_id)
        .map_err(SwapError::merge_library)?
        .clone();
    let info = principal.trailer.get(b"Info").ok().cloned();

    let mut document = Document::with_version(principal.version.clone());
    document.max_id = next_id - 1;
    let pages_id = document.new_object_id();

    let placed: HashSet<ObjectId> = sequence.iter().map(|page| page.id).collect();
    for source in std::iter::once(principal).chain(sources) {
        for (id, object) in source.objects {
            let type_name = object.type_name().unwrap_or_default();
            if DROPPED_TYPES.contains(&type_name) || (type_name == "Page" && !placed.contains(&id))
            {
                continue;
            }
            document.objects.insert(id, object);
        }
    }

    let mut kids = Vec::with_capacity(sequence.len());
    for page in sequence {
        match document.objects.get_mut(&page.id) {
            Some(Object::Dictionary(dict)) => dict.set("Parent", pages_id),
            _ => {
                return Err(SwapError::merge_library(format!(
                    "page object {} {} R is missing",
                    page.id.0, page.id.1
                )))
            }
        }
        kids.push(Object::Reference(page.id));
    }

    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sequence.len() as i64,
        }),
    );

    catalog.set("Pages", pages_id);
    for key in STALE_CATALOG_KEYS {
        catalog.remove(key);
    }
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog));
    document.trailer.set("Root", catalog_id);
    if let Some(info) = info {
        document.trailer.set("Info", info);
    }

    Ok(document)
}

/// Draw `label` on a page in its own graphics state.
fn stamp_page(
    document: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    label: &str,
    options: &StampOptions,
) -> SwapResult<()> {
    let page = document
        .get_dictionary(page_id)
        .map_err(SwapError::merge_library)?;
    let [x0, y0, x1, _] = pdf::visible_box(document, page);
    let font_size = options.font_size as f32;

    let x = match options.pos_x {
        Some(x) => x0 + x as f32,
        None => {
            let width = label.chars().count() as f32 * font_size * HELVETICA_AVG_WIDTH;
            (x1 - STAMP_MARGIN - width).max(x0)
        }
    };
    let y = match options.pos_y {
        Some(y) => y0 + y as f32,
        None => y0 + STAMP_MARGIN,
    };

    let mut resources = pdf::resolve_dictionary(document, page.get(b"Resources").ok());
    let mut fonts = pdf::resolve_dictionary(document, resources.get(b"Font").ok());
    fonts.set(STAMP_FONT, font_id);
    resources.set("Font", fonts);
    let contents = page.get(b"Contents").ok().cloned();

    let label_ops = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![STAMP_FONT.into(), Object::Integer(options.font_size.into())],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(label)]),
            Operation::new("ET", vec![]),
        ],
    };
    // Restore whatever state the page content left behind before drawing
    let mut closing = b"\nQ\n".to_vec();
    closing.extend(label_ops.encode().map_err(SwapError::merge_library)?);

    let opening_id = document.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let closing_id = document.add_object(Stream::new(Dictionary::new(), closing));

    let mut streams = vec![Object::Reference(opening_id)];
    match contents {
        Some(Object::Array(existing)) => streams.extend(existing),
        Some(existing @ Object::Reference(_)) => streams.push(existing),
        _ => {}
    }
    streams.push(Object::Reference(closing_id));

    match document.get_object_mut(page_id) {
        Ok(Object::Dictionary(page)) => {
            page.set("Resources", resources);
            page.set("Contents", streams);
            Ok(())
        }
        _ => Err(SwapError::merge_library(format!(
            "page object {} {} R is not a dictionary",
            page_id.0, page_id.1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::PatternLocator;
    use pdf_swap_test_suite::generators::{invalid_pdfs, TestPdfBuilder};
    use pdf_swap_test_suite::inspect::{page_count, page_texts};
    use std::path::Path;

    fn annex<'a>(name: &'a str, pattern: &'a str, content: &'a [u8]) -> Annex<'a> {
        Annex {
            name,
            pattern,
            content,
            path: Path::new(""),
        }
    }

    fn principal() -> Vec<u8> {
        TestPdfBuilder::new()
            .page(&["Cover"])
            .page(&["Chapter", "PDF_1"])
            .page(&["PDF_2"])
            .page(&["Back"])
            .build()
    }

    fn annex_pdf(tag: &str, pages: usize) -> Vec<u8> {
        TestPdfBuilder::new().pages(tag, pages).build()
    }

    fn swap(principal: &[u8], annexes: &[Annex<'_>], options: AssemblyOptions) -> ResultDocument {
        let matches = PatternLocator::from_bytes(principal)
            .unwrap()
            .locate(annexes)
            .unwrap();
        PdfAssembler::new(options)
            .assemble(pdf::load_principal(principal).unwrap(), annexes, &matches)
            .unwrap()
    }

    #[test]
    fn test_nominal_splice() {
        let principal = principal();
        let first = annex_pdf("First", 3);
        let second = annex_pdf("Second", 3);
        let annexes = [
            annex("pdf_1.pdf", "PDF_1", &first),
            annex("pdf_2.pdf", "PDF_2", &second),
        ];

        let result = swap(&principal, &annexes, AssemblyOptions::default());
        assert_eq!(result.page_count, 8);
        assert_eq!(page_count(&result.bytes), 8);

        let texts = page_texts(&result.bytes);
        assert!(texts[0].contains("Cover"));
        assert!(texts[1].contains("First page 1"));
        assert!(texts[3].contains("First page 3"));
        assert!(texts[4].contains("Second page 1"));
        assert!(texts[6].contains("Second page 3"));
        assert!(texts[7].contains("Back"));
        assert!(texts.iter().all(|t| !t.contains("PDF_1") && !t.contains("PDF_2")));
    }

    #[test]
    fn test_declared_order_does_not_matter() {
        let principal = principal();
        let first = annex_pdf("First", 1);
        let second = annex_pdf("Second", 2);
        // Declared in reverse page order
        let annexes = [
            annex("pdf_2.pdf", "PDF_2", &second),
            annex("pdf_1.pdf", "PDF_1", &first),
        ];

        let result = swap(&principal, &annexes, AssemblyOptions::default());
        let texts = page_texts(&result.bytes);
        assert_eq!(texts.len(), 4 - 2 + 1 + 2);
        assert!(texts[1].contains("First page 1"));
        assert!(texts[2].contains("Second page 1"));
        assert!(texts[3].contains("Second page 2"));
    }

    #[test]
    fn test_zero_annexes_round_trip() {
        let principal = principal();
        let result = swap(&principal, &[], AssemblyOptions::default());
        assert_eq!(page_texts(&result.bytes), page_texts(&principal));
    }

    #[test]
    fn test_numbering_only_annex_pages() {
        let principal = principal();
        let first = annex_pdf("First", 3);
        let second = annex_pdf("Second", 2);
        let annexes = [
            annex("pdf_1.pdf", "PDF_1", &first),
            annex("pdf_2.pdf", "PDF_2", &second),
        ];
        let options = AssemblyOptions {
            number_annex_pages: true,
            stamp: StampOptions::default(),
        };

        let texts = page_texts(&swap(&principal, &annexes, options).bytes);
        assert_eq!(texts.len(), 7);
        assert!(!texts[0].contains(" / "));
        assert!(texts[1].contains("1 / 3"));
        assert!(texts[2].contains("2 / 3"));
        assert!(texts[3].contains("3 / 3"));
        assert!(texts[4].contains("1 / 2"));
        assert!(texts[5].contains("2 / 2"));
        assert!(!texts[6].contains(" / "));
        // Original annex content is still there
        assert!(texts[2].contains("First page 2"));
    }

    #[test]
    fn test_without_numbering_no_label() {
        let principal = principal();
        let first = annex_pdf("First", 2);
        let annexes = [annex("pdf_1.pdf", "PDF_1", &first)];

        let texts = page_texts(&swap(&principal, &annexes, AssemblyOptions::default()).bytes);
        assert!(texts.iter().all(|t| !t.contains(" / ")));
    }

    #[test]
    fn test_two_annexes_on_same_page() {
        let principal = TestPdfBuilder::new()
            .page(&["Cover"])
            .page(&["ANCHOR_A", "ANCHOR_B"])
            .build();
        let a = annex_pdf("Alpha", 1);
        let b = annex_pdf("Beta", 2);
        let annexes = [
            annex("a.pdf", "ANCHOR_A", &a),
            annex("b.pdf", "ANCHOR_B", &b),
        ];

        let texts = page_texts(&swap(&principal, &annexes, AssemblyOptions::default()).bytes);
        assert_eq!(texts.len(), 4);
        assert!(texts[1].contains("Alpha page 1"));
        assert!(texts[2].contains("Beta page 1"));
        assert!(texts[3].contains("Beta page 2"));
    }

    #[test]
    fn test_nested_page_trees() {
        let principal = TestPdfBuilder::new()
            .nested()
            .page(&["Cover"])
            .page(&["PDF_1"])
            .page(&["Back"])
            .build();
        let first = TestPdfBuilder::new()
            .nested()
            .page(&["Nested page 1"])
            .page(&["Nested page 2"])
            .build();
        let annexes = [annex("pdf_1.pdf", "PDF_1", &first)];
        let options = AssemblyOptions {
            number_annex_pages: true,
            stamp: StampOptions::default(),
        };

        let texts = page_texts(&swap(&principal, &annexes, options).bytes);
        assert_eq!(texts.len(), 4);
        assert!(texts[0].contains("Cover"));
        assert!(texts[1].contains("Nested page 1"));
        assert!(texts[2].contains("2 / 2"));
        assert!(texts[3].contains("Back"));
    }

    #[test]
    fn test_corrupt_annex() {
        let principal = principal();
        let broken = invalid_pdfs::truncated(&annex_pdf("First", 2));
        let annexes = [annex("pdf_1.pdf", "PDF_1", &broken)];
        let matches = vec![PatternMatch {
            annex_name: "pdf_1.pdf".into(),
            page_index: 1,
        }];

        let error = assemble(&principal, &annexes, &matches, false).unwrap_err();
        assert!(error
            .to_string()
            .starts_with("Error while opening annexe \"pdf_1.pdf\" ("));
    }

    #[test]
    fn test_out_of_bounds_match() {
        let principal = principal();
        let first = annex_pdf("First", 1);
        let annexes = [annex("pdf_1.pdf", "PDF_1", &first)];
        let matches = vec![PatternMatch {
            annex_name: "pdf_1.pdf".into(),
            page_index: 9,
        }];

        let error = assemble(&principal, &annexes, &matches, false).unwrap_err();
        assert!(error.to_string().starts_with("Error from merge library ("));
    }

    #[test]
    fn test_cancelled_assembly() {
        let principal = principal();
        let first = annex_pdf("First", 1);
        let annexes = [annex("pdf_1.pdf", "PDF_1", &first)];
        let matches = vec![PatternMatch {
            annex_name: "pdf_1.pdf".into(),
            page_index: 1,
        }];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = PdfAssembler::new(AssemblyOptions::default())
            .with_cancel(cancel)
            .assemble(pdf::load_principal(&principal).unwrap(), &annexes, &matches)
            .unwrap_err();
        assert_eq!(error, SwapError::Cancelled);
    }

    #[test]
    fn test_explicit_stamp_position() {
        let principal = principal();
        let first = annex_pdf("First", 1);
        let annexes = [annex("pdf_1.pdf", "PDF_1", &first)];
        let options = AssemblyOptions {
            number_annex_pages: true,
            stamp: StampOptions {
                font_size: 14,
                pos_x: Some(0),
                pos_y: Some(0),
            },
        };

        let texts = page_texts(&swap(&principal, &annexes, options).bytes);
        assert!(texts[1].contains("1 / 1"));
    }

    /// Where the page-number label of result page `index` starts
    fn stamp_origin(bytes: &[u8], index: usize) -> (f32, f32) {
        let document = Document::load_mem(bytes).unwrap();
        let page_id = pdf::page_ids(&document)[index];
        let content = Content::decode(&document.get_page_content(page_id).unwrap()).unwrap();

        let stamp = content
            .operations
            .iter()
            .position(|op| {
                op.operator == "Tf"
                    && op.operands.first().and_then(|name| name.as_name().ok())
                        == Some(STAMP_FONT.as_bytes())
            })
            .unwrap();
        let td = &content.operations[stamp + 1];
        assert_eq!(td.operator, "Td");
        (
            td.operands[0].as_float().unwrap(),
            td.operands[1].as_float().unwrap(),
        )
    }

    #[test]
    fn test_default_stamp_inside_crop_box() {
        let principal = principal();
        let cropped = TestPdfBuilder::new()
            .nested()
            .with_crop_box([50, 50, 300, 400])
            .pages("Cropped", 1)
            .build();
        let annexes = [annex("pdf_1.pdf", "PDF_1", &cropped)];
        let options = AssemblyOptions {
            number_annex_pages: true,
            stamp: StampOptions::default(),
        };

        let result = swap(&principal, &annexes, options);
        // "1 / 1" at 10pt is about 25pt wide
        assert_eq!(stamp_origin(&result.bytes, 1), (255.0, 70.0));
    }

    #[test]
    fn test_explicit_stamp_position_from_visible_origin() {
        let principal = principal();
        let shifted = TestPdfBuilder::new()
            .with_media_box([100, 100, 400, 500])
            .pages("Shifted", 2)
            .build();
        let annexes = [annex("pdf_1.pdf", "PDF_1", &shifted)];
        let options = AssemblyOptions {
            number_annex_pages: true,
            stamp: StampOptions {
                font_size: 12,
                pos_x: Some(5),
                pos_y: Some(15),
            },
        };

        let result = swap(&principal, &annexes, options);
        assert_eq!(stamp_origin(&result.bytes, 1), (105.0, 115.0));
        assert_eq!(stamp_origin(&result.bytes, 2), (105.0, 115.0));
        assert!(page_texts(&result.bytes)[2].contains("2 / 2"));
    }
}
