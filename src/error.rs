//! Error types for the epub-ingest library.
//!
//! Two distinct kinds of failure reflect two distinct outcomes:
//!
//! * [`LoadError`] is **fatal**: the load cannot proceed at all (not a zip
//!   archive, missing container descriptor, package document without a
//!   spine). It wraps one stage-specific enum per pipeline stage
//!   ([`ArchiveError`], [`ContainerError`], [`PackageError`]) and is
//!   returned as `Err(LoadError)` from the top-level `load*` functions and
//!   from [`crate::session::DocumentSession::load`].
//!
//! * [`ChapterLoadWarning`] is **non-fatal**: a single spine entry could not
//!   be read. The entry is skipped and the warning is recorded in
//!   [`crate::output::Document::warnings`]; loading carries on with the
//!   remaining spine entries.
//!
//! Each fatal variant's `Display` is the human-readable message a front
//! end shows for that failure.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the epub-ingest library.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source archive could not be opened or extracted.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// `META-INF/container.xml` is missing or does not name a package document.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// The package document is missing, malformed, or lacks a required section.
    #[error(transparent)]
    Package(#[from] PackageError),

    /// A newer load on the same session started before this one finished;
    /// this result was discarded and never published.
    #[error("Load of '{path}' was superseded by a newer load")]
    Superseded { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the archive-extraction stage.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Input file was not found at the given path.
    #[error("EPUB file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a zip archive.
    #[error("File is not a valid EPUB archive: '{path}': {detail}")]
    NotAnArchive { path: PathBuf, detail: String },

    /// A fresh scratch directory could not be created.
    #[error("Failed to create scratch directory under '{root}': {source}")]
    ScratchDir {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An archive entry could not be written into the scratch directory.
    #[error("Failed to extract '{entry}' from '{path}': {detail}")]
    ExtractFailed {
        path: PathBuf,
        entry: String,
        detail: String,
    },

    /// Total uncompressed size exceeds the configured limit.
    #[error("Archive '{path}' expands to more than {limit} bytes")]
    TooLarge { path: PathBuf, limit: u64 },
}

/// Failures resolving the container descriptor.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Missing, malformed, or without a `rootfile@full-path`.
    #[error("Invalid EPUB container (META-INF/container.xml): {reason}")]
    InvalidContainer { reason: String },
}

/// Failures parsing the package document (OPF).
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package document is missing or is not well-formed XML.
    #[error("Invalid package document '{path}': {detail}")]
    InvalidOpf { path: PathBuf, detail: String },

    /// The package document has no `<metadata>` section.
    #[error("Package document '{path}' has no <metadata> section")]
    InvalidMetadata { path: PathBuf },

    /// The package document has no `<manifest>` section.
    #[error("Package document '{path}' has no <manifest> section")]
    InvalidManifest { path: PathBuf },

    /// The package document has no `<spine>` section.
    #[error("Package document '{path}' has no <spine> section")]
    InvalidSpine { path: PathBuf },
}

/// A non-fatal error for a single spine entry.
///
/// The entry is skipped and no chapter index is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ChapterLoadWarning {
    /// The chapter file could not be read from the scratch directory.
    #[error("Chapter '{idref}' ({path}) could not be read: {detail}")]
    Unreadable {
        idref: String,
        path: PathBuf,
        detail: String,
    },
}

impl ChapterLoadWarning {
    /// The spine `idref` this warning is about.
    pub fn idref(&self) -> &str {
        match self {
            ChapterLoadWarning::Unreadable { idref, .. } => idref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_display_through_load_error() {
        let e: LoadError = ContainerError::InvalidContainer {
            reason: "rootfile has no full-path attribute".into(),
        }
        .into();
        let msg = e.to_string();
        assert!(msg.contains("container.xml"), "got: {msg}");
        assert!(msg.contains("full-path"), "got: {msg}");
    }

    #[test]
    fn package_error_names_missing_section() {
        let e = LoadError::from(PackageError::InvalidSpine {
            path: PathBuf::from("OEBPS/content.opf"),
        });
        assert!(e.to_string().contains("<spine>"));
        assert!(e.to_string().contains("content.opf"));
    }

    #[test]
    fn too_large_display() {
        let e = ArchiveError::TooLarge {
            path: PathBuf::from("big.epub"),
            limit: 1024,
        };
        assert!(e.to_string().contains("1024"));
    }

    #[test]
    fn warning_exposes_idref() {
        let w = ChapterLoadWarning::Unreadable {
            idref: "ch3".into(),
            path: PathBuf::from("/tmp/x/ch3.xhtml"),
            detail: "No such file or directory".into(),
        };
        assert_eq!(w.idref(), "ch3");
        assert!(w.to_string().contains("ch3.xhtml"));
    }
}
