//! Value types produced by a load: metadata, manifest entries, chapters,
//! and the aggregate [`Document`].
//!
//! Everything here is immutable once built. Navigation on a
//! [`crate::session::DocumentSession`] does not mutate a `Document`; it
//! publishes a new one that shares the same chapter list.

use crate::error::ChapterLoadWarning;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bibliographic metadata read from the package document's `<metadata>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// `dc:title`, or `"Untitled"`.
    pub title: String,
    pub creator: Option<String>,
    /// `dc:language`, or `"en"`.
    pub language: String,
    /// `dc:identifier`, or a freshly generated UUID.
    pub identifier: String,
    pub publisher: Option<String>,
    pub date: Option<String>,
    pub rights: Option<String>,
}

/// One retained (HTML/XHTML) manifest item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    /// Path relative to the package document's directory, as written in the OPF.
    pub href: String,
    pub media_type: String,
    /// Label from the navigation document, when one names this resource.
    pub title: Option<String>,
}

/// A rendered chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Manifest id of the source resource. Not unique when the spine
    /// references the same resource more than once.
    pub id: String,
    pub title: String,
    /// Normalised plain text, never empty.
    pub content: String,
    /// 0-based position in the final chapter sequence.
    pub index: usize,
}

/// Direction for [`crate::session::DocumentSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
}

/// A loaded document: metadata, ordered chapters and the current chapter.
///
/// The current chapter is tracked by position so that repeated spine
/// references (two chapters sharing one manifest id) stay navigable.
/// Only [`Document::new`] and the navigation methods build one, so the
/// current index always points into `chapters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub metadata: PackageMetadata,
    pub chapters: Arc<[Chapter]>,
    #[serde(rename = "current_index")]
    current: Option<usize>,
    /// Spine entries that were skipped because they could not be read.
    pub warnings: Vec<ChapterLoadWarning>,
}

impl Document {
    /// Build a document with the first chapter selected (or none when empty).
    pub fn new(
        metadata: PackageMetadata,
        chapters: Vec<Chapter>,
        warnings: Vec<ChapterLoadWarning>,
    ) -> Self {
        let current = if chapters.is_empty() { None } else { Some(0) };
        Self {
            metadata,
            chapters: chapters.into(),
            current,
            warnings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.current.and_then(|i| self.chapters.get(i))
    }

    pub fn current_chapter_id(&self) -> Option<&str> {
        self.current_chapter().map(|c| c.id.as_str())
    }

    /// First chapter with the given manifest id.
    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// True when there is no chapter before the current one.
    pub fn is_first(&self) -> bool {
        self.current.map_or(true, |i| i == 0)
    }

    /// True when there is no chapter after the current one.
    pub fn is_last(&self) -> bool {
        self.current.map_or(true, |i| i.saturating_add(1) >= self.chapters.len())
    }

    /// A copy pointing at the first chapter with `id`, or `None` if no
    /// chapter has that id.
    pub fn with_current_id(&self, id: &str) -> Option<Self> {
        let idx = self.chapters.iter().position(|c| c.id == id)?;
        Some(self.with_current(idx))
    }

    /// A copy pointing at the adjacent chapter, or `None` at either edge.
    pub fn advanced(&self, direction: Direction) -> Option<Self> {
        let current = self.current?;
        let next = match direction {
            Direction::Forward => current.checked_add(1).filter(|&n| n < self.chapters.len())?,
            Direction::Backward => current.checked_sub(1)?,
        };
        Some(self.with_current(next))
    }

    fn with_current(&self, idx: usize) -> Self {
        Self {
            metadata: self.metadata.clone(),
            chapters: Arc::clone(&self.chapters),
            current: Some(idx),
            warnings: self.warnings.clone(),
        }
    }
}
