//! Configuration types for EPUB ingestion.
//!
//! All loader behaviour is controlled through [`LoaderConfig`], built via its
//! [`LoaderConfigBuilder`]. One struct for every knob means a session can
//! hold a single clone and hand it to each load it runs.

use crate::error::LoadError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default scratch directory name prefix.
pub const DEFAULT_SCRATCH_PREFIX: &str = "epub-ingest-";

/// Default cap on the total uncompressed size of an archive (512 MiB).
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 512 * 1024 * 1024;

/// Configuration for loading an EPUB.
///
/// Built via [`LoaderConfig::builder()`] or using [`LoaderConfig::default()`].
///
/// # Example
/// ```rust
/// use epub_ingest::LoaderConfig;
///
/// let config = LoaderConfig::builder()
///     .scratch_prefix("reader-")
///     .resolve_toc_titles(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct LoaderConfig {
    /// Parent directory for scratch extraction directories.
    /// If None, uses the OS temp dir.
    pub scratch_root: Option<PathBuf>,

    /// Name prefix for scratch directories. Default: `"epub-ingest-"`.
    ///
    /// A UUID is appended, so two loads never share a directory.
    pub scratch_prefix: String,

    /// Maximum total uncompressed bytes extracted from one archive.
    /// Default: 512 MiB.
    ///
    /// Zip entries declare their uncompressed size up front, so a hostile
    /// archive is rejected before anything large hits the disk.
    pub max_extracted_bytes: u64,

    /// Derive chapter titles from the navigation document (EPUB 3 nav or
    /// EPUB 2 NCX). Default: true.
    ///
    /// When off, or when the book has no usable table of contents, every
    /// chapter gets the `"Chapter N"` fallback title.
    pub resolve_toc_titles: bool,

    /// Optional per-chapter progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            scratch_root: None,
            scratch_prefix: DEFAULT_SCRATCH_PREFIX.to_string(),
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            resolve_toc_titles: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("scratch_root", &self.scratch_root)
            .field("scratch_prefix", &self.scratch_prefix)
            .field("max_extracted_bytes", &self.max_extracted_bytes)
            .field("resolve_toc_titles", &self.resolve_toc_titles)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn LoadProgressCallback>"),
            )
            .finish()
    }
}

impl LoaderConfig {
    /// Create a new builder for `LoaderConfig`.
    pub fn builder() -> LoaderConfigBuilder {
        LoaderConfigBuilder {
            config: Self::default(),
        }
    }

    /// The directory scratch directories are created in.
    pub fn scratch_parent(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`LoaderConfig`].
#[derive(Debug)]
pub struct LoaderConfigBuilder {
    config: LoaderConfig,
}

impl LoaderConfigBuilder {
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(root.into());
        self
    }

    pub fn scratch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.scratch_prefix = prefix.into();
        self
    }

    pub fn max_extracted_bytes(mut self, bytes: u64) -> Self {
        self.config.max_extracted_bytes = bytes;
        self
    }

    pub fn resolve_toc_titles(mut self, v: bool) -> Self {
        self.config.resolve_toc_titles = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<LoaderConfig, LoadError> {
        let c = &self.config;
        if c.scratch_prefix.is_empty() {
            return Err(LoadError::InvalidConfig(
                "Scratch prefix must not be empty".into(),
            ));
        }
        if c.scratch_prefix.contains(['/', '\\']) {
            return Err(LoadError::InvalidConfig(format!(
                "Scratch prefix must not contain a path separator, got {:?}",
                c.scratch_prefix
            )));
        }
        if c.max_extracted_bytes < 1024 {
            return Err(LoadError::InvalidConfig(format!(
                "max_extracted_bytes must be ≥ 1024, got {}",
                c.max_extracted_bytes
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let c = LoaderConfig::builder().build().unwrap();
        assert_eq!(c.scratch_prefix, DEFAULT_SCRATCH_PREFIX);
        assert!(c.resolve_toc_titles);
        assert_eq!(c.scratch_parent(), std::env::temp_dir());
    }

    #[test]
    fn rejects_prefix_with_separator() {
        let err = LoaderConfig::builder()
            .scratch_prefix("../escape")
            .build()
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_prefix() {
        assert!(LoaderConfig::builder().scratch_prefix("").build().is_err());
    }

    #[test]
    fn rejects_tiny_extraction_limit() {
        assert!(LoaderConfig::builder()
            .max_extracted_bytes(10)
            .build()
            .is_err());
    }

    #[test]
    fn debug_hides_callback() {
        let c = LoaderConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        assert!(format!("{c:?}").contains("<dyn LoadProgressCallback>"));
    }
}
