//! Document session: a small state machine around the load pipeline.
//!
//! ```text
//!            load()              ok
//!   Empty ──────────▶ Loading ────────▶ Loaded ──┐
//!     ▲                  │  err            │     │ set_current_chapter()
//!     └──────────────────┘                 │     │ advance()
//!     ▲            teardown()              │     │
//!     └────────────────────────────────────┘ ◀───┘
//! ```
//!
//! State is published on a [`tokio::sync::watch`] channel as immutable
//! snapshots. Readers see either the previous [`Document`] or the next one,
//! never a partly built one.
//!
//! ## Overlapping loads
//!
//! Every `load` and `teardown` bumps a generation counter. A load only
//! publishes if its generation is still current when it finishes, so the
//! most recently *started* load wins. An outdated load stops waiting on
//! its pipeline as soon as it is superseded and returns
//! [`LoadError::Superseded`]; its scratch directory is removed when the
//! abandoned pipeline's [`SourceArchive`] is dropped.

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::load::{self, LoadedEpub};
use crate::output::{Direction, Document};
use crate::pipeline::archive::SourceArchive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// A published session snapshot.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Loading {
        source: PathBuf,
    },
    Loaded(Arc<Document>),
}

impl SessionState {
    /// The loaded document, if any.
    pub fn document(&self) -> Option<&Arc<Document>> {
        match self {
            SessionState::Loaded(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }
}

/// Owns at most one extracted book and its published state.
///
/// All methods take `&self`; wrap the session in an `Arc` to share it
/// between tasks.
pub struct DocumentSession {
    config: LoaderConfig,
    state: watch::Sender<SessionState>,
    generation: watch::Sender<u64>,
    archive: Mutex<Option<SourceArchive>>,
}

impl DocumentSession {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            state: watch::channel(SessionState::Empty).0,
            generation: watch::channel(0).0,
            archive: Mutex::new(None),
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current document, if the session is loaded.
    pub fn document(&self) -> Option<Arc<Document>> {
        self.state.borrow().document().cloned()
    }

    /// Load `path`, replacing whatever the session held.
    ///
    /// The previous scratch directory is removed before extraction starts.
    /// On failure the session is left `Empty` and the stage error is
    /// returned; no partial document is ever published.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Document>, LoadError> {
        let path = path.as_ref().to_path_buf();
        let generation = self.next_generation();

        {
            let mut slot = self.archive.lock().await;
            if let Some(previous) = slot.take() {
                close_archive(previous);
            }
            self.state.send_replace(SessionState::Loading {
                source: path.clone(),
            });
        }

        let result = tokio::select! {
            result = load::load(&path, &self.config) => result,
            _ = superseded(self.generation.subscribe(), generation) => {
                Err(LoadError::Superseded { path: path.clone() })
            }
        };

        let mut slot = self.archive.lock().await;
        if *self.generation.borrow() != generation {
            // Dropping `result` here removes this attempt's scratch directory.
            debug!("Discarding superseded load of {}", path.display());
            return Err(LoadError::Superseded { path });
        }

        match result {
            Ok(LoadedEpub { document, archive }) => {
                let document = Arc::new(document);
                *slot = Some(archive);
                self.state
                    .send_replace(SessionState::Loaded(Arc::clone(&document)));
                info!("Session loaded '{}'", document.metadata.title);
                Ok(document)
            }
            Err(e) => {
                warn!("Load of {} failed: {}", path.display(), e);
                self.state.send_replace(SessionState::Empty);
                Err(e)
            }
        }
    }

    /// Make the first chapter with `id` current.
    ///
    /// Returns `false` (and publishes nothing) when no document is loaded,
    /// no chapter has that id, or it is already current.
    pub fn set_current_chapter(&self, id: &str) -> bool {
        self.state.send_if_modified(|state| {
            let SessionState::Loaded(doc) = state else {
                return false;
            };
            match doc.with_current_id(id) {
                Some(next) if next.current_index() != doc.current_index() => {
                    *doc = Arc::new(next);
                    true
                }
                _ => false,
            }
        })
    }

    /// Move to the adjacent chapter. Returns `false` at either edge of the
    /// book or when nothing is loaded.
    pub fn advance(&self, direction: Direction) -> bool {
        self.state.send_if_modified(|state| {
            let SessionState::Loaded(doc) = state else {
                return false;
            };
            match doc.advanced(direction) {
                Some(next) => {
                    *doc = Arc::new(next);
                    true
                }
                None => false,
            }
        })
    }

    /// Remove the scratch directory and return to `Empty`.
    ///
    /// Also invalidates any load still in flight. Safe to call repeatedly.
    pub async fn teardown(&self) {
        self.next_generation();
        let mut slot = self.archive.lock().await;
        if let Some(archive) = slot.take() {
            close_archive(archive);
        }
        self.state.send_replace(SessionState::Empty);
    }

    /// Scratch directory of the loaded book, if any.
    pub async fn scratch_dir(&self) -> Option<PathBuf> {
        self.archive
            .lock()
            .await
            .as_ref()
            .map(|a| a.scratch_dir().to_path_buf())
    }

    fn next_generation(&self) -> u64 {
        let mut current = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            current = *g;
        });
        current
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

/// Resolves once the generation moves past `generation`.
async fn superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    while *rx.borrow_and_update() == generation {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn close_archive(archive: SourceArchive) {
    let dir = archive.scratch_dir().to_path_buf();
    if let Err(e) = archive.close() {
        warn!("Failed to remove scratch directory {}: {}", dir.display(), e);
    }
}
