//! Streaming load API: emit chapters one at a time.
//!
//! Unlike the eager [`crate::load::load`], which reads every chapter before
//! returning, [`load_stream`] returns as soon as the package document is
//! parsed. Chapters are then read lazily, in spine order, as the stream is
//! polled, with the same contiguous indexing as the eager path.
//!
//! The stream owns the scratch directory. It is removed when the stream is
//! exhausted or dropped, whichever comes first.

use crate::config::LoaderConfig;
use crate::error::{ChapterLoadWarning, LoadError};
use crate::load::open_package;
use crate::output::{Chapter, PackageMetadata};
use crate::pipeline::archive::SourceArchive;
use crate::pipeline::content::{ChapterLoader, SpineStep};
use crate::pipeline::package::Package;
use crate::progress::ProgressCallback;
use futures::stream;
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of chapters; unreadable entries arrive as `Err`.
pub type ChapterStream = Pin<Box<dyn Stream<Item = Result<Chapter, ChapterLoadWarning>> + Send>>;

struct StreamState {
    loader: ChapterLoader,
    spine: std::vec::IntoIter<String>,
    spine_len: usize,
    progress: Option<ProgressCallback>,
    _archive: SourceArchive,
}

/// Open an EPUB and stream its chapters.
///
/// # Returns
/// - `Ok((metadata, ChapterStream))` once the package document is parsed
/// - `Err(LoadError)`: fatal error (not a zip, bad container, bad OPF)
///
/// # Example
/// ```rust,no_run
/// use epub_ingest::{load_stream, LoaderConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (metadata, mut chapters) = load_stream("book.epub", &LoaderConfig::default()).await?;
/// println!("# {}", metadata.title);
/// while let Some(chapter) = chapters.next().await {
///     match chapter {
///         Ok(c) => println!("{}: {} chars", c.title, c.content.len()),
///         Err(w) => eprintln!("warning: {w}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn load_stream(
    path: impl AsRef<Path>,
    config: &LoaderConfig,
) -> Result<(PackageMetadata, ChapterStream), LoadError> {
    let path = path.as_ref();
    info!("Starting streaming load: {}", path.display());

    let (archive, package) = open_package(path, config).await?;
    let Package {
        metadata,
        manifest,
        spine,
        base_dir,
        ..
    } = package;

    if let Some(ref cb) = config.progress_callback {
        cb.on_load_start(spine.len());
    }

    let state = StreamState {
        loader: ChapterLoader::new(
            manifest,
            archive.scratch_dir(),
            base_dir,
            config.progress_callback.clone(),
        ),
        spine_len: spine.len(),
        spine: spine.into_iter(),
        progress: config.progress_callback.clone(),
        _archive: archive,
    };

    let s = stream::unfold(state, |mut st| async move {
        while let Some(idref) = st.spine.next() {
            match st.loader.load(&idref).await {
                SpineStep::Loaded(chapter) => return Some((Ok(chapter), st)),
                SpineStep::Unreadable(warning) => return Some((Err(warning), st)),
                SpineStep::Skipped => {}
            }
        }
        if let Some(ref cb) = st.progress {
            cb.on_load_complete(st.spine_len, st.loader.emitted());
        }
        None
    });

    Ok((metadata, Box::pin(s)))
}
