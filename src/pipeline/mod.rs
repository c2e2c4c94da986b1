//! Pipeline stages for EPUB ingestion.
//!
//! Each submodule implements exactly one step. Stages only communicate
//! through plain values (paths, [`package::Package`], [`crate::output::Chapter`]),
//! so each one is testable without the others.
//!
//! ## Data Flow
//!
//! ```text
//! archive ──▶ container ──▶ package (+ toc) ──▶ content ──▶ normalize
//! (unzip)     (OPF path)    (meta/manifest/    (read +     (markup →
//!                            spine)             decode)     plain text)
//! ```
//!
//! 1. [`archive`]: unpack the `.epub` into a private scratch directory;
//!    runs in `spawn_blocking` because `zip` is synchronous
//! 2. [`container`]: read `META-INF/container.xml` and return the package
//!    document path
//! 3. [`package`]: metadata, retained manifest and spine from the OPF;
//!    [`toc`] fills manifest titles from the navigation document
//! 4. [`content`]: walk the spine in order, read and [`decode`] each
//!    chapter, skip what is missing or empty
//! 5. [`normalize`]: deterministic markup-to-text rules
//!
//! [`href`] and [`xml`] are shared helpers for path resolution and
//! element lookup.

pub mod archive;
pub mod container;
pub mod content;
pub mod decode;
pub mod href;
pub mod normalize;
pub mod package;
pub mod toc;
pub(crate) mod xml;
