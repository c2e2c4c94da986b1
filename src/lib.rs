//! # epub-ingest
//!
//! Turn an EPUB file into an ordered list of plain-text chapters.
//!
//! The crate unpacks the archive into a private scratch directory, follows
//! `META-INF/container.xml` to the package document, reads metadata,
//! manifest and spine, then renders every spine entry's (X)HTML into
//! paragraph-structured text. It does not lay out or paginate anything; a
//! reader front end consumes the resulting [`Document`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! .epub
//!  │
//!  ├─ 1. Archive     unzip into <tmp>/epub-ingest-<uuid> (spawn_blocking)
//!  ├─ 2. Container   META-INF/container.xml → package document path
//!  ├─ 3. Package     OPF metadata, HTML manifest entries, spine, TOC titles
//!  ├─ 4. Content     per spine entry: read → decode → normalise
//!  └─ 5. Document    metadata + contiguous chapters + current chapter
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use epub_ingest::{load, LoaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loaded = load("book.epub", &LoaderConfig::default()).await?;
//!     for chapter in loaded.document.chapters.iter() {
//!         println!("## {}\n\n{}\n", chapter.title, chapter.content);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For a reader that reloads books and navigates chapters, use
//! [`DocumentSession`]; its state can be watched with
//! [`DocumentSession::subscribe`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `epub2text` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! epub-ingest = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod load;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{LoaderConfig, LoaderConfigBuilder};
pub use error::{ArchiveError, ChapterLoadWarning, ContainerError, LoadError, PackageError};
pub use load::{inspect, inspect_with_config, load, load_from_bytes, load_sync, LoadedEpub};
pub use output::{Chapter, Direction, Document, ManifestEntry, PackageMetadata};
pub use pipeline::archive::SourceArchive;
pub use pipeline::normalize::normalize;
pub use progress::{LoadProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{DocumentSession, SessionState};
pub use stream::{load_stream, ChapterStream};
