//! PDF text extraction for konbikol.
//!
//! ```text
//!   file ──read──▶ bytes ──▶ DeferredLoader ──▶ TextEngine::open
//!                                                    │
//!                                                    ▼ page 1
//!                                              EnginePage::text_content
//!                                                    │
//!                                                    ▼
//!                                               Vec<String>
//! ```
//!
//! - [`Extractor`] - runs the pipeline for one file at a time
//! - [`DeferredLoader`] - loads the engine once and shares the outcome
//! - [`TextEngine`] - the engine seam, implemented by [`LopdfEngine`]
//! - [`ExtractError`] - stage-tagged failures with user-facing messages
//!
//! # Example
//!
//! ```ignore
//! use konbikol_extract::{Extractor, LOPDF_ENGINE};
//!
//! let extractor = Extractor::for_engine(LOPDF_ENGINE);
//! match extractor.extract_text(Path::new("ticket.pdf")).await {
//!     Ok(fragments) => println!("{fragments:?}"),
//!     Err(e) => eprintln!("{}", e.user_message()),
//! }
//! ```

pub mod engine;
pub mod error;
pub mod loader;
pub mod pdf;
pub mod pipeline;

pub use engine::{
    BoxFuture, EngineDocument, EnginePage, LOPDF_ENGINE, TextContent, TextEngine, TextItem,
    engine_loader, load_engine,
};
pub use error::{
    EngineFailure, ExtractError, ExtractErrorKind, ExtractResult, INVALID_DOCUMENT_MESSAGE,
    INVALID_PDF_EXCEPTION, LoadError, classify_message,
};
pub use loader::{DeferredLoader, LoaderState};
pub use pdf::LopdfEngine;
pub use pipeline::{Extractor, FIRST_PAGE};
