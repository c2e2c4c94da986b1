//! Archive extraction: unpack an `.epub` into a private scratch directory.
//!
//! ## Why extract to disk?
//!
//! Chapters are read one at a time after the package document has been
//! parsed, and a front end may want the extracted images and stylesheets
//! later. Unpacking once into a [`TempDir`] gives every later stage a plain
//! filesystem path, and the directory is removed automatically when the
//! owning [`SourceArchive`] is dropped. That covers session reset as well
//! as failed or abandoned loads.

use crate::config::LoaderConfig;
use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::ZipArchive;

/// The original EPUB path plus the scratch directory it was unpacked into.
///
/// Exclusively owned by whoever loaded it; dropping it removes the
/// scratch directory.
#[derive(Debug)]
pub struct SourceArchive {
    source: PathBuf,
    scratch: TempDir,
}

impl SourceArchive {
    /// Path of the original `.epub` file.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Absolute path of the extracted archive root.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Remove the scratch directory now, reporting any I/O error.
    ///
    /// Dropping the archive does the same but swallows errors.
    pub fn close(self) -> io::Result<()> {
        let dir = self.scratch.path().to_path_buf();
        self.scratch.close()?;
        debug!("Removed scratch directory {}", dir.display());
        Ok(())
    }
}

/// Unpack `source` into a fresh, uniquely-named scratch directory.
///
/// Runs inside `spawn_blocking` since `zip` reads synchronously. If the
/// caller stops awaiting, the blocking task still finishes and its
/// `SourceArchive` is dropped, so the directory never outlives the load.
pub async fn extract(source: &Path, config: &LoaderConfig) -> Result<SourceArchive, ArchiveError> {
    let source = source.to_path_buf();
    let parent = config.scratch_parent();
    let prefix = config.scratch_prefix.clone();
    let limit = config.max_extracted_bytes;

    let task_source = source.clone();
    tokio::task::spawn_blocking(move || extract_blocking(&task_source, &parent, &prefix, limit))
        .await
        .map_err(|e| ArchiveError::ExtractFailed {
            path: source,
            entry: String::new(),
            detail: format!("extraction task failed: {e}"),
        })?
}

/// Blocking implementation of archive extraction.
fn extract_blocking(
    source: &Path,
    parent: &Path,
    prefix: &str,
    limit: u64,
) -> Result<SourceArchive, ArchiveError> {
    let file = open_source(source)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| ArchiveError::NotAnArchive {
            path: source.to_path_buf(),
            detail: e.to_string(),
        })?;

    let scratch = create_scratch_dir(parent, prefix)?;
    let root = scratch.path().to_path_buf();
    let mut written: u64 = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ArchiveError::ExtractFailed {
            path: source.to_path_buf(),
            entry: format!("#{i}"),
            detail: e.to_string(),
        })?;
        let name = entry.name().to_string();

        let Some(rel) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {:?}", name);
            continue;
        };
        let target = root.join(rel);

        let fail = |detail: String| ArchiveError::ExtractFailed {
            path: source.to_path_buf(),
            entry: name.clone(),
            detail,
        };

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| fail(e.to_string()))?;
            continue;
        }

        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
        }

        // Declared sizes can lie; cap the actual copy at the remaining budget.
        let remaining = limit.saturating_sub(written);
        if entry.size() > remaining {
            return Err(ArchiveError::TooLarge {
                path: source.to_path_buf(),
                limit,
            });
        }
        let mut out = File::create(&target).map_err(|e| fail(e.to_string()))?;
        let copied = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)
            .map_err(|e| fail(e.to_string()))?;
        if copied > remaining {
            return Err(ArchiveError::TooLarge {
                path: source.to_path_buf(),
                limit,
            });
        }
        written += copied;
    }

    info!(
        "Extracted {} entries ({} bytes) from {} into {}",
        archive.len(),
        written,
        source.display(),
        root.display()
    );

    Ok(SourceArchive {
        source: source.to_path_buf(),
        scratch,
    })
}

/// Open the source file, mapping the common failures to precise errors.
fn open_source(path: &Path) -> Result<File, ArchiveError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArchiveError::FileNotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => ArchiveError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ArchiveError::NotAnArchive {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
    })
}

/// Create `<parent>/<prefix><uuid>`; the UUID keeps concurrent loads apart.
fn create_scratch_dir(parent: &Path, prefix: &str) -> Result<TempDir, ArchiveError> {
    let scratch_err = |source: io::Error| ArchiveError::ScratchDir {
        root: parent.to_path_buf(),
        source,
    };
    fs::create_dir_all(parent).map_err(scratch_err)?;
    tempfile::Builder::new()
        .prefix(&format!("{prefix}{}", Uuid::new_v4()))
        .rand_bytes(0)
        .tempdir_in(parent)
        .map_err(scratch_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    fn config_in(root: &Path) -> LoaderConfig {
        LoaderConfig::builder().scratch_root(root).build().unwrap()
    }

    #[tokio::test]
    async fn extracts_entries_into_unique_dirs() {
        let tmp = TempDir::new().unwrap();
        let epub = tmp.path().join("book.epub");
        write_zip(&epub, &[("META-INF/container.xml", b"<container/>")]);
        let config = config_in(&tmp.path().join("scratch"));

        let a = extract(&epub, &config).await.unwrap();
        let b = extract(&epub, &config).await.unwrap();
        assert_ne!(a.scratch_dir(), b.scratch_dir());
        assert!(a.scratch_dir().join("META-INF/container.xml").is_file());
        assert_eq!(a.source(), epub.as_path());

        let dir = a.scratch_dir().to_path_buf();
        drop(a);
        assert!(!dir.exists(), "scratch dir must be removed on drop");
        b.close().unwrap();
    }

    #[tokio::test]
    async fn scratch_dir_uses_prefix() {
        let tmp = TempDir::new().unwrap();
        let epub = tmp.path().join("book.epub");
        write_zip(&epub, &[("mimetype", b"application/epub+zip")]);
        let config = LoaderConfig::builder()
            .scratch_root(tmp.path())
            .scratch_prefix("reader-")
            .build()
            .unwrap();

        let archive = extract(&epub, &config).await.unwrap();
        let name = archive.scratch_dir().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("reader-"), "got {name}");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = extract(&tmp.path().join("nope.epub"), &config_in(tmp.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn garbage_is_not_an_archive_and_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let epub = tmp.path().join("bad.epub");
        fs::write(&epub, b"this is not a zip file").unwrap();
        let scratch_root = tmp.path().join("scratch");

        let err = extract(&epub, &config_in(&scratch_root)).await.unwrap_err();
        assert!(matches!(err, ArchiveError::NotAnArchive { .. }));
        let leftovers = fs::read_dir(&scratch_root).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn oversize_archive_is_rejected_and_cleaned_up() {
        let tmp = TempDir::new().unwrap();
        let epub = tmp.path().join("big.epub");
        let payload = vec![b'a'; 4096];
        write_zip(&epub, &[("a.txt", &payload), ("b.txt", &payload)]);
        let scratch_root = tmp.path().join("scratch");
        let config = LoaderConfig::builder()
            .scratch_root(&scratch_root)
            .max_extracted_bytes(5000)
            .build()
            .unwrap();

        let err = extract(&epub, &config).await.unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { limit: 5000, .. }));
        assert_eq!(fs::read_dir(&scratch_root).unwrap().count(), 0);
    }
}
