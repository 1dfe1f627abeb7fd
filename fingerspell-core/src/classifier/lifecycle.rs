//! Memoised classifier loading.
//!
//! ## Lifecycle
//!
//! ```text
//! Unloaded ──load()──► Loading ──warm_up Ok──► Ready
//!                         │
//!                         └──warm_up Err──► Failed ──reload()──► Loading
//! ```
//!
//! The first `load()` spawns the single load task and every concurrent caller
//! waits on the same `watch` channel, so N callers cause one `warm_up` and all
//! see the same outcome. `Failed` is sticky: `load()` reports the stored error
//! until `reload()` is called explicitly.
//!
//! A load task that dies without reporting (its runtime was shut down while
//! `warm_up` ran) leaves `Loading` behind with a closed channel. The next
//! waiter records that as `Failed`, and `reload()` retries it like any other
//! failure.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::classifier::{ClassifierHandle, GroupScores};
use crate::error::{FingerspellError, Result};
use crate::render::Canvas;

type LoadOutcome = std::result::Result<(), Arc<str>>;

enum LoadState {
    Unloaded,
    Loading(watch::Receiver<Option<LoadOutcome>>),
    Ready,
    Failed(Arc<str>),
}

/// Observable load state (snapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// A classifier plus its load lifecycle. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ClassifierRuntime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    handle: ClassifierHandle,
    state: Mutex<LoadState>,
    load_attempts: AtomicUsize,
}

impl ClassifierRuntime {
    pub fn new(handle: ClassifierHandle) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                handle,
                state: Mutex::new(LoadState::Unloaded),
                load_attempts: AtomicUsize::new(0),
            }),
        }
    }

    pub fn status(&self) -> LoadStatus {
        match &*self.inner.state.lock() {
            LoadState::Unloaded => LoadStatus::Unloaded,
            LoadState::Loading(_) => LoadStatus::Loading,
            LoadState::Ready => LoadStatus::Ready,
            LoadState::Failed(_) => LoadStatus::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == LoadStatus::Ready
    }

    /// Number of underlying `warm_up` calls started so far.
    pub fn load_attempts(&self) -> usize {
        self.inner.load_attempts.load(Ordering::SeqCst)
    }

    /// Load the classifier, or join the load already in progress.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// `AssetLoad` if this load (or the earlier, still-sticky one) failed.
    pub async fn load(&self) -> Result<()> {
        let mut rx = {
            let mut state = self.inner.state.lock();
            match &*state {
                LoadState::Ready => return Ok(()),
                LoadState::Failed(msg) => {
                    return Err(FingerspellError::AssetLoad(msg.to_string()));
                }
                LoadState::Loading(rx) => rx.clone(),
                LoadState::Unloaded => {
                    let (tx, rx) = watch::channel(None);
                    *state = LoadState::Loading(rx.clone());
                    self.spawn_load(tx);
                    rx
                }
            }
        };

        let waited = rx.wait_for(Option::is_some).await.map(|published| published.clone());
        let outcome = match waited {
            Ok(published) => published
                .unwrap_or_else(|| Err(Arc::from("classifier load reported no outcome"))),
            Err(_) => Err(self.abandon_load(&rx)),
        };
        outcome.map_err(|msg| FingerspellError::AssetLoad(msg.to_string()))
    }

    /// The load task behind `rx` dropped its sender without an outcome.
    /// Turn its `Loading` state into `Failed` so it is not waited on forever.
    fn abandon_load(&self, rx: &watch::Receiver<Option<LoadOutcome>>) -> Arc<str> {
        let msg: Arc<str> = Arc::from("classifier load task ended without reporting");
        let mut state = self.inner.state.lock();
        match &*state {
            LoadState::Loading(current) if current.same_channel(rx) => {
                warn!("classifier load task was abandoned");
                *state = LoadState::Failed(Arc::clone(&msg));
                msg
            }
            LoadState::Failed(stored) => Arc::clone(stored),
            _ => msg,
        }
    }

    /// Clear a sticky failure and load again. A no-op on a ready classifier.
    /// A load whose task has gone away is retried too; a live one is joined.
    pub async fn reload(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match &*state {
                LoadState::Failed(msg) => {
                    warn!(previous_error = %msg, "retrying classifier load");
                    *state = LoadState::Unloaded;
                }
                LoadState::Loading(rx) if rx.has_changed().is_err() => {
                    warn!("retrying abandoned classifier load");
                    *state = LoadState::Unloaded;
                }
                _ => {}
            }
        }
        self.load().await
    }

    /// Score a canvas with the loaded classifier.
    ///
    /// # Errors
    /// `NotReady` before a successful load; backend errors otherwise.
    pub fn predict(&self, canvas: &Canvas) -> Result<GroupScores> {
        if !self.is_ready() {
            return Err(FingerspellError::NotReady);
        }
        self.inner.handle.0.lock().predict(canvas)
    }

    fn spawn_load(&self, tx: watch::Sender<Option<LoadOutcome>>) {
        let inner = Arc::clone(&self.inner);
        let attempt = inner.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::spawn(async move {
            info!(attempt, "loading group classifier");
            let handle = inner.handle.clone();
            let outcome: LoadOutcome =
                match tokio::task::spawn_blocking(move || handle.0.lock().warm_up()).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(Arc::from(e.to_string())),
                    Err(e) => Err(Arc::from(format!("classifier load task panicked: {e}"))),
                };

            *inner.state.lock() = match &outcome {
                Ok(()) => LoadState::Ready,
                Err(msg) => LoadState::Failed(Arc::clone(msg)),
            };
            match &outcome {
                Ok(()) => info!(attempt, "group classifier ready"),
                Err(msg) => error!(attempt, error = %msg, "group classifier load failed"),
            }
            let _ = tx.send(Some(outcome));
        });
    }
}

impl std::fmt::Debug for ClassifierRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierRuntime")
            .field("status", &self.status())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}
