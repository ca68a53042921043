//! Deferred, load-once activation of the text engine.
//!
//! The first caller of [`DeferredLoader::ensure_loaded`] (or
//! [`DeferredLoader::preload`]) schedules the load on a background task,
//! one scheduler tick later. Everyone, before or after the load settles,
//! awaits the same shared future and observes the same outcome. A failed
//! load is terminal.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::Shared;
use tracing::{debug, warn};

use crate::engine::BoxFuture;
use crate::error::LoadError;

type LoadResult<T> = Result<Arc<T>, LoadError>;
type LoadFn<T> = Box<dyn Fn(String) -> BoxFuture<'static, LoadResult<T>> + Send + Sync>;
type SharedLoad<T> = Shared<BoxFuture<'static, LoadResult<T>>>;

/// Where a loader is in its lifecycle. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoaderState {
    NotStarted = 0,
    Loading = 1,
    Ready = 2,
    Failed = 3,
}

impl LoaderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::Loading,
            2 => Self::Ready,
            _ => Self::Failed,
        }
    }

    /// Whether the load has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

/// Loads a `T` from `source` at most once and shares the result.
pub struct DeferredLoader<T: ?Sized + Send + Sync + 'static> {
    source: String,
    load: LoadFn<T>,
    state: Arc<AtomicU8>,
    pending: Mutex<Option<SharedLoad<T>>>,
}

impl<T: ?Sized + Send + Sync + 'static> DeferredLoader<T> {
    /// Creates an idle loader. Nothing happens until the first await.
    pub fn new<F>(source: impl Into<String>, load: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, LoadResult<T>> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            load: Box::new(load),
            state: Arc::new(AtomicU8::new(LoaderState::NotStarted as u8)),
            pending: Mutex::new(None),
        }
    }

    /// The source this loader was created for.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> LoaderState {
        LoaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Resolves once the value is loaded, starting the load if needed.
    pub async fn ensure_loaded(&self) -> LoadResult<T> {
        self.shared().await
    }

    /// Starts loading in the background without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn preload(&self) {
        let _ = self.shared();
    }

    fn shared(&self) -> SharedLoad<T> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.get_or_insert_with(|| self.start()).clone()
    }

    fn start(&self) -> SharedLoad<T> {
        debug!(source = %self.source, "Scheduling load");
        self.state.store(LoaderState::Loading as u8, Ordering::Release);

        let load = (self.load)(self.source.clone());
        let state = Arc::clone(&self.state);
        let source = self.source.clone();

        let task = tokio::spawn(async move {
            // Never run initialisation on the caller's turn.
            tokio::task::yield_now().await;

            let result = load.await;
            let settled = match &result {
                Ok(_) => LoaderState::Ready,
                Err(e) => {
                    warn!(origin = %e.origin, reason = %e.reason, "Load failed");
                    LoaderState::Failed
                }
            };
            state.store(settled as u8, Ordering::Release);
            result
        });

        let joined: BoxFuture<'static, LoadResult<T>> = Box::pin(async move {
            task.await
                .unwrap_or_else(|e| Err(LoadError::new(source, format!("load task failed: {e}"))))
        });
        joined.shared()
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for DeferredLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLoader")
            .field("source", &self.source)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
