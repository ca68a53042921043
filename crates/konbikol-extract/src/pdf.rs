//! lopdf-backed text engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use lopdf::{Document, Encoding, Object, ObjectId};
use tracing::debug;

use crate::engine::{BoxFuture, EngineDocument, EnginePage, LOPDF_ENGINE, TextContent, TextEngine, TextItem};
use crate::error::EngineFailure;

/// How far into the file the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A `TJ` adjustment below this (thousandths of an em) reads as a word gap.
const WORD_GAP: f32 = -100.0;

/// Text engine built on [`lopdf`].
#[derive(Debug, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TextEngine for LopdfEngine {
    fn name(&self) -> &str {
        LOPDF_ENGINE
    }

    fn open(&self, data: Vec<u8>) -> BoxFuture<'_, Result<Box<dyn EngineDocument>, EngineFailure>> {
        Box::pin(async move {
            if !has_pdf_header(&data) {
                return Err(EngineFailure::invalid_pdf("Invalid PDF structure."));
            }

            let document = tokio::task::spawn_blocking(move || Document::load_mem(&data))
                .await
                .map_err(|e| EngineFailure::new("UnknownErrorException", e.to_string()))?
                .map_err(|e| EngineFailure::invalid_pdf(e.to_string()))?;

            let pages = document.get_pages();
            Ok(Box::new(LopdfDocument {
                document: Arc::new(document),
                pages,
            }) as Box<dyn EngineDocument>)
        })
    }
}

fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

struct LopdfDocument {
    document: Arc<Document>,
    /// Page number to page object.
    pages: BTreeMap<u32, ObjectId>,
}

impl EngineDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, number: u32) -> BoxFuture<'_, Result<Box<dyn EnginePage>, EngineFailure>> {
        Box::pin(async move {
            let Some(&id) = self.pages.get(&number) else {
                return Err(EngineFailure::new("Error", "Invalid page request."));
            };
            Ok(Box::new(LopdfPage {
                document: Arc::clone(&self.document),
                number,
                id,
            }) as Box<dyn EnginePage>)
        })
    }
}

struct LopdfPage {
    document: Arc<Document>,
    number: u32,
    id: ObjectId,
}

impl EnginePage for LopdfPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn text_content(&self) -> BoxFuture<'_, Result<TextContent, EngineFailure>> {
        let document = Arc::clone(&self.document);
        let id = self.id;
        Box::pin(async move {
            let items = tokio::task::spawn_blocking(move || page_text_items(&document, id))
                .await
                .map_err(|e| EngineFailure::new("UnknownErrorException", e.to_string()))?
                .map_err(|e| EngineFailure::new("FormatError", e.to_string()))?;
            Ok(TextContent { items })
        })
    }
}

/// One item per text-showing operator (`Tj`, `TJ`, `'`, `"`), in content
/// stream order, decoded with the encoding of the font selected by `Tf`.
fn page_text_items(document: &Document, page_id: ObjectId) -> lopdf::Result<Vec<TextItem>> {
    let encodings: BTreeMap<Vec<u8>, Encoding<'_>> = document
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(document) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                debug!(
                    font = %String::from_utf8_lossy(&name),
                    error = %e,
                    "Skipping font without a usable encoding"
                );
                None
            }
        })
        .collect();
    let content = document.get_and_decode_page_content(page_id)?;

    let mut encoding = None;
    let mut items = Vec::new();
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|font| font.as_name().ok())
                    .and_then(|name| encodings.get(name));
            }
            "Tj" | "TJ" | "'" | "\"" => match encoding {
                Some(encoding) => items.push(TextItem::new(decode_run(encoding, &operation.operands)?)),
                None => debug!(operator = %operation.operator, "Text shown without a decodable font"),
            },
            _ => {}
        }
    }
    Ok(items)
}

/// Concatenates the strings shown by one operator. Spacing numbers are
/// dropped except wide `TJ` gaps, which become a single space.
fn decode_run(encoding: &Encoding<'_>, operands: &[Object]) -> lopdf::Result<String> {
    let mut text = String::new();
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)?),
            Object::Array(parts) => {
                for part in parts {
                    match part {
                        Object::String(bytes, _) => {
                            text.push_str(&Document::decode_text(encoding, bytes)?)
                        }
                        other => {
                            if other.as_float().is_ok_and(|adjust| adjust < WORD_GAP) {
                                text.push(' ');
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(text)
}
