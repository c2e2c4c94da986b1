//! Eager (whole-book) load entry points.
//!
//! These functions run the full pipeline once and hand back a finished
//! [`Document`] together with the [`SourceArchive`] that owns the scratch
//! directory. They keep no state between calls; use
//! [`crate::session::DocumentSession`] for reload and navigation, or
//! [`crate::stream::load_stream`] to receive chapters one at a time.

use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::output::{Document, PackageMetadata};
use crate::pipeline::archive::{self, SourceArchive};
use crate::pipeline::package::{self, Package};
use crate::pipeline::{container, content};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// A loaded book plus the scratch directory its resources were unpacked to.
///
/// Keep `archive` alive as long as the extracted files (images, styles)
/// are needed; dropping it removes the directory.
#[derive(Debug)]
pub struct LoadedEpub {
    pub document: Document,
    pub archive: SourceArchive,
}

/// Load an EPUB file into a [`Document`].
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(LoadedEpub)` on success, even if some chapters were unreadable
/// (check `document.warnings`) or the book has no text at all
/// (`document.is_empty()`).
///
/// # Errors
/// Returns `Err(LoadError)` only for fatal errors:
/// - File not found / permission denied / not a zip archive
/// - Missing or malformed `META-INF/container.xml`
/// - Package document missing, malformed, or lacking a required section
///
/// No scratch directory survives a failed load.
pub async fn load(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<LoadedEpub, LoadError> {
    let start = Instant::now();
    let path = path.as_ref();
    info!("Loading EPUB: {}", path.display());

    // ── Steps 1-3: Extract, resolve container, parse package ─────────────
    let (archive, package) = open_package(path, config).await?;
    let Package {
        metadata,
        manifest,
        spine,
        base_dir,
        ..
    } = package;

    // ── Step 4: Load chapters in spine order ─────────────────────────────
    let loaded = content::load_chapters(
        &spine,
        manifest,
        archive.scratch_dir(),
        &base_dir,
        config.progress_callback.clone(),
    )
    .await;

    // ── Step 5: Assemble document ────────────────────────────────────────
    let document = Document::new(metadata, loaded.chapters, loaded.warnings);
    info!(
        "Loaded '{}': {} chapters from {} spine entries ({} unreadable), {}ms",
        document.metadata.title,
        document.chapters.len(),
        spine.len(),
        document.warnings.len(),
        start.elapsed().as_millis()
    );

    Ok(LoadedEpub { document, archive })
}

/// Synchronous wrapper around [`load`].
///
/// Creates a temporary tokio runtime internally.
pub fn load_sync(path: impl AsRef<Path>, config: &LoaderConfig) -> Result<LoadedEpub, LoadError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LoadError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(load(path, config))
}

/// Load an EPUB held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed before
/// this returns, so [`SourceArchive::source`] of the result names a path
/// that no longer exists. The scratch directory is unaffected.
///
/// # Example
/// ```rust,no_run
/// use epub_ingest::{load_from_bytes, LoaderConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("book.epub")?;
/// let loaded = load_from_bytes(&bytes, &LoaderConfig::default()).await?;
/// println!("{} chapters", loaded.document.chapters.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_from_bytes(bytes: &[u8], config: &LoaderConfig) -> Result<LoadedEpub, LoadError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".epub")
        .tempfile()
        .map_err(|e| LoadError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| LoadError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `load` returns
    load(tmp.path(), config).await
}

/// Read the package metadata without loading any chapter.
///
/// The scratch directory is removed before this returns.
pub async fn inspect(path: impl AsRef<Path>) -> Result<PackageMetadata, LoadError> {
    inspect_with_config(path, &LoaderConfig::default()).await
}

/// [`inspect`] with an explicit config, so the scratch root and
/// extraction limit are honoured. TOC titles are never resolved.
pub async fn inspect_with_config(
    path: impl AsRef<Path>,
    config: &LoaderConfig,
) -> Result<PackageMetadata, LoadError> {
    let config = LoaderConfig {
        resolve_toc_titles: false,
        ..config.clone()
    };
    let (_archive, package) = open_package(path.as_ref(), &config).await?;
    Ok(package.metadata)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Extract the archive and parse its package document.
///
/// On any error the partially-built [`SourceArchive`] is dropped here,
/// which removes its scratch directory.
pub(crate) async fn open_package(
    path: &Path,
    config: &LoaderConfig,
) -> Result<(SourceArchive, Package), LoadError> {
    let archive = archive::extract(path, config).await?;
    let opf_rel = container::resolve_opf_path(archive.scratch_dir()).await?;
    let package = package::parse_package(archive.scratch_dir(), &opf_rel, config).await?;
    Ok((archive, package))
}
