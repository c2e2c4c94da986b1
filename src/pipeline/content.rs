//! Content loading: walk the spine, read each chapter file, decode and
//! normalise it into a [`Chapter`].
//!
//! A spine reference is skipped (no chapter, no index consumed) when:
//! - its idref is not a retained manifest entry (unknown id, image, CSS…)
//! - its file cannot be read; this also records a [`ChapterLoadWarning`]
//! - its text is empty after normalisation
//!
//! Chapter indices are assigned in emission order, so they are always
//! dense (`0..n`) whatever was skipped.

use crate::error::ChapterLoadWarning;
use crate::output::{Chapter, ManifestEntry};
use crate::pipeline::{decode, href, normalize};
use crate::progress::ProgressCallback;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of one spine reference.
#[derive(Debug)]
pub enum SpineStep {
    Loaded(Chapter),
    /// Dropped silently (unknown id or empty text).
    Skipped,
    /// Dropped because the file could not be read.
    Unreadable(ChapterLoadWarning),
}

/// Stateful spine walker shared by the eager and streaming loaders.
pub struct ChapterLoader {
    manifest: HashMap<String, ManifestEntry>,
    scratch_dir: PathBuf,
    base_dir: String,
    next_index: usize,
    /// Fallback titles already handed out, so a repeated id keeps its title.
    fallback_titles: HashMap<String, String>,
    progress: Option<ProgressCallback>,
}

impl ChapterLoader {
    pub fn new(
        manifest: HashMap<String, ManifestEntry>,
        scratch_dir: impl Into<PathBuf>,
        base_dir: impl Into<String>,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            manifest,
            scratch_dir: scratch_dir.into(),
            base_dir: base_dir.into(),
            next_index: 0,
            fallback_titles: HashMap::new(),
            progress,
        }
    }

    /// Number of chapters emitted so far.
    pub fn emitted(&self) -> usize {
        self.next_index
    }

    /// Process the next spine reference.
    pub async fn load(&mut self, idref: &str) -> SpineStep {
        let Some(entry) = self.manifest.get(idref) else {
            debug!("Spine idref '{}' has no HTML manifest entry; skipping", idref);
            self.notify_skipped(idref, "no HTML manifest entry");
            return SpineStep::Skipped;
        };

        let rel = href::resolve(&self.base_dir, &entry.href);
        let path = href::to_fs_path(&self.scratch_dir, &rel);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let warning = ChapterLoadWarning::Unreadable {
                    idref: idref.to_string(),
                    path,
                    detail: e.to_string(),
                };
                warn!("{}", warning);
                self.notify_skipped(idref, &warning.to_string());
                return SpineStep::Unreadable(warning);
            }
        };

        let content = normalize::normalize(&decode::decode_text(&bytes));
        if content.is_empty() {
            debug!("Chapter '{}' ({}) is empty after normalisation; skipping", idref, rel);
            self.notify_skipped(idref, "empty after normalisation");
            return SpineStep::Skipped;
        }

        let index = self.next_index;
        self.next_index += 1;
        let title = match &entry.title {
            Some(title) => title.clone(),
            None => self
                .fallback_titles
                .entry(entry.id.clone())
                .or_insert_with(|| format!("Chapter {}", index + 1))
                .clone(),
        };

        if let Some(ref cb) = self.progress {
            cb.on_chapter_loaded(index, &title, content.len());
        }
        debug!("Chapter {} '{}' ({} bytes)", index + 1, title, content.len());

        SpineStep::Loaded(Chapter {
            id: entry.id.clone(),
            title,
            content,
            index,
        })
    }

    fn notify_skipped(&self, idref: &str, reason: &str) {
        if let Some(ref cb) = self.progress {
            cb.on_chapter_skipped(idref, reason);
        }
    }
}

/// Chapters in emission order plus the warnings for unreadable entries.
#[derive(Debug, Default)]
pub struct LoadedChapters {
    pub chapters: Vec<Chapter>,
    pub warnings: Vec<ChapterLoadWarning>,
}

/// Load every chapter named by `spine`, in order.
///
/// Never fails: unreadable entries become warnings and the walk carries
/// on. Fires `on_load_start` / `on_load_complete` around the walk.
pub async fn load_chapters(
    spine: &[String],
    manifest: HashMap<String, ManifestEntry>,
    scratch_dir: &Path,
    base_dir: &str,
    progress: Option<ProgressCallback>,
) -> LoadedChapters {
    if let Some(ref cb) = progress {
        cb.on_load_start(spine.len());
    }

    let mut loader = ChapterLoader::new(manifest, scratch_dir, base_dir, progress.clone());
    let mut out = LoadedChapters::default();
    for idref in spine {
        match loader.load(idref).await {
            SpineStep::Loaded(chapter) => out.chapters.push(chapter),
            SpineStep::Unreadable(warning) => out.warnings.push(warning),
            SpineStep::Skipped => {}
        }
    }

    if let Some(ref cb) = progress {
        cb.on_load_complete(spine.len(), out.chapters.len());
    }
    out
}
