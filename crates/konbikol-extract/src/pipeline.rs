//! File to text fragments.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::engine::{TextEngine, engine_loader};
use crate::error::{ExtractError, ExtractResult};
use crate::loader::DeferredLoader;

/// The only page ever read.
pub const FIRST_PAGE: u32 = 1;

/// Extracts the text fragments of a document's first page.
///
/// Holds no per-document state: every call reads, opens and projects from
/// scratch. The engine loader is shared across calls and clones.
#[derive(Debug, Clone)]
pub struct Extractor {
    loader: Arc<DeferredLoader<dyn TextEngine>>,
}

impl Extractor {
    /// Creates an extractor around an existing loader.
    pub fn new(loader: Arc<DeferredLoader<dyn TextEngine>>) -> Self {
        Self { loader }
    }

    /// Creates an extractor that loads the engine named `source` on first use.
    pub fn for_engine(source: impl Into<String>) -> Self {
        Self::new(Arc::new(engine_loader(source)))
    }

    pub fn loader(&self) -> &DeferredLoader<dyn TextEngine> {
        &self.loader
    }

    /// Reads the file at `path` and extracts its first page.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn extract_text(&self, path: &Path) -> ExtractResult<Vec<String>> {
        let data = tokio::fs::read(path).await.map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_bytes(data).await
    }

    /// Extracts the first page of an in-memory document.
    pub async fn extract_bytes(&self, data: Vec<u8>) -> ExtractResult<Vec<String>> {
        let engine = self.loader.ensure_loaded().await?;
        debug!(engine = engine.name(), bytes = data.len(), "Opening document");

        let document = engine.open(data).await.map_err(ExtractError::from_open)?;
        debug!(pages = document.page_count(), "Opened document");

        let page = document
            .page(FIRST_PAGE)
            .await
            .map_err(ExtractError::Engine)?;
        let content = page.text_content().await.map_err(ExtractError::Engine)?;

        let fragments = content.into_strings();
        debug!(page = page.number(), ?fragments, "Extracted text");
        Ok(fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LOPDF_ENGINE;
    use crate::error::ExtractErrorKind;
    use crate::pdf::fixtures::{pdf_with_operations, pdf_with_pages, text_object};

    fn extractor() -> Extractor {
        Extractor::for_engine(LOPDF_ENGINE)
    }

    #[tokio::test]
    async fn extracts_first_page_fragments_in_order() {
        let bytes = pdf_with_pages(&[&["Flight", "AB123", "2024-05-01"]]);
        let fragments = extractor().extract_bytes(bytes).await.unwrap();
        assert_eq!(fragments, ["Flight", "AB123", "2024-05-01"]);
    }

    #[tokio::test]
    async fn runs_sharing_a_text_object_are_not_joined() {
        let bytes = pdf_with_operations(vec![text_object(&["Flight", "AB123", "2024-05-01"], 720)]);
        let fragments = extractor().extract_bytes(bytes).await.unwrap();
        assert_eq!(fragments, ["Flight", "AB123", "2024-05-01"]);
    }

    #[tokio::test]
    async fn later_pages_are_ignored() {
        let bytes = pdf_with_pages(&[&["Page one"], &["Page two"]]);
        let fragments = extractor().extract_bytes(bytes).await.unwrap();
        assert_eq!(fragments, ["Page one"]);
    }

    #[tokio::test]
    async fn repeated_extraction_is_stable_and_never_stale() {
        let extractor = extractor();
        let first = pdf_with_pages(&[&["Warszawa Centralna"]]);
        let second = pdf_with_pages(&[&["Kraków Glowny"]]);

        let a = extractor.extract_bytes(first.clone()).await.unwrap();
        let b = extractor.extract_bytes(first).await.unwrap();
        let c = extractor.extract_bytes(second).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(c, ["Kraków Glowny"]);
    }

    #[tokio::test]
    async fn non_pdf_input_is_an_invalid_document() {
        let err = extractor()
            .extract_bytes(b"\x89PNG\r\n\x1a\n".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::InvalidDocument);
        assert_eq!(err.user_message(), "Not a valid PDF file");
    }

    #[tokio::test]
    async fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ticket.pdf");
        std::fs::write(&path, pdf_with_pages(&[&["IC 5310", "Kraków"]])).unwrap();

        let fragments = extractor().extract_text(&path).await.unwrap();
        assert_eq!(fragments, ["IC 5310", "Kraków"]);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extractor()
            .extract_text(&dir.path().join("nope.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ExtractErrorKind::ReadError);
        assert!(err.user_message().starts_with("NotReadableError ("));
    }

    #[tokio::test]
    async fn unknown_engine_fails_every_request() {
        let extractor = Extractor::for_engine("pdf.js");
        let bytes = pdf_with_pages(&[&["x"]]);

        let first = extractor.extract_bytes(bytes.clone()).await.unwrap_err();
        let second = extractor.extract_bytes(bytes).await.unwrap_err();

        assert_eq!(first.kind(), ExtractErrorKind::LoadError);
        assert_eq!(second.user_message(), "LoadError (pdf.js)");
    }

    #[tokio::test]
    async fn clones_share_the_loader() {
        let extractor = extractor();
        let clone = extractor.clone();
        clone.extract_bytes(pdf_with_pages(&[&["x"]])).await.unwrap();
        assert!(extractor.loader().state().is_settled());
    }
}
