//! The text engine abstraction.
//!
//! The pipeline talks to a PDF engine only through these traits: open a
//! document from bytes, fetch a page by its 1-based number, and read the
//! page's text items. Engines are resolved by name through [`load_engine`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{EngineFailure, LoadError};
use crate::loader::DeferredLoader;
use crate::pdf::LopdfEngine;

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Engine name of the bundled lopdf backend.
pub const LOPDF_ENGINE: &str = "lopdf";

/// A loaded PDF engine.
pub trait TextEngine: Send + Sync {
    /// Engine name, for logging.
    fn name(&self) -> &str;

    /// Parses `data` as a document.
    fn open(&self, data: Vec<u8>) -> BoxFuture<'_, Result<Box<dyn EngineDocument>, EngineFailure>>;
}

/// An opened document.
pub trait EngineDocument: Send + Sync {
    fn page_count(&self) -> u32;

    /// Fetches page `number`, counting from 1.
    fn page(&self, number: u32) -> BoxFuture<'_, Result<Box<dyn EnginePage>, EngineFailure>>;
}

/// A single page of an opened document.
pub trait EnginePage: Send + Sync {
    fn number(&self) -> u32;

    fn text_content(&self) -> BoxFuture<'_, Result<TextContent, EngineFailure>>;
}

/// One run of text shown by a single text operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub text: String,
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The text of a page, in engine order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContent {
    pub items: Vec<TextItem>,
}

impl TextContent {
    /// Drops item metadata, keeping each item's string in order.
    pub fn into_strings(self) -> Vec<String> {
        self.items.into_iter().map(|item| item.text).collect()
    }
}

/// Resolves an engine by source name.
pub fn load_engine(source: String) -> BoxFuture<'static, Result<Arc<dyn TextEngine>, LoadError>> {
    Box::pin(async move {
        match source.as_str() {
            LOPDF_ENGINE => Ok(Arc::new(LopdfEngine::new()) as Arc<dyn TextEngine>),
            _ => Err(LoadError::new(source, "unknown text engine")),
        }
    })
}

/// A deferred loader for the engine named `source`.
pub fn engine_loader(source: impl Into<String>) -> DeferredLoader<dyn TextEngine> {
    DeferredLoader::new(source, load_engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoaderState;

    #[test]
    fn text_content_keeps_order_and_duplicates() {
        let content = TextContent {
            items: vec![
                TextItem::new("Warszawa"),
                TextItem::new("Kraków"),
                TextItem::new("Warszawa"),
            ],
        };
        assert_eq!(content.into_strings(), ["Warszawa", "Kraków", "Warszawa"]);
    }

    #[tokio::test]
    async fn loads_bundled_engine() {
        let loader = engine_loader(LOPDF_ENGINE);
        let engine = loader.ensure_loaded().await.unwrap();
        assert_eq!(engine.name(), LOPDF_ENGINE);
        assert_eq!(loader.state(), LoaderState::Ready);
    }

    #[tokio::test]
    async fn unknown_engine_fails_with_its_source() {
        let loader = engine_loader("https://cdn.example/pdf.min.js");
        let err = loader.ensure_loaded().await.err().unwrap();
        assert_eq!(err.origin, "https://cdn.example/pdf.min.js");
        assert_eq!(loader.state(), LoaderState::Failed);
    }
}
