//! Progress-callback trait for per-chapter load events.
//!
//! Inject an [`Arc<dyn LoadProgressCallback>`] via
//! [`crate::config::LoaderConfigBuilder::progress_callback`] to receive
//! events as the content loader walks the spine.
//!
//! # Example
//!
//! ```rust
//! use epub_ingest::{LoadProgressCallback, LoaderConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     loaded: AtomicUsize,
//! }
//!
//! impl LoadProgressCallback for CountingCallback {
//!     fn on_chapter_loaded(&self, index: usize, title: &str, text_len: usize) {
//!         self.loaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Chapter {} '{}' ({} bytes)", index + 1, title, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { loaded: AtomicUsize::new(0) });
//!
//! let config = LoaderConfig::builder()
//!     .progress_callback(counter as Arc<dyn LoadProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the content loader as it processes each spine entry.
///
/// Chapters are loaded strictly in spine order on one task, so events for
/// a single load never overlap. The trait is still `Send + Sync` because a
/// session may run on any runtime worker.
pub trait LoadProgressCallback: Send + Sync {
    /// Called once the spine is known, before any chapter is read.
    ///
    /// # Arguments
    /// * `spine_len`: number of spine references (an upper bound on chapters)
    fn on_load_start(&self, spine_len: usize) {
        let _ = spine_len;
    }

    /// Called when a chapter is emitted.
    ///
    /// # Arguments
    /// * `index`: 0-based chapter index
    /// * `title`: resolved chapter title
    /// * `text_len`: byte length of the normalised text
    fn on_chapter_loaded(&self, index: usize, title: &str, text_len: usize) {
        let _ = (index, title, text_len);
    }

    /// Called when a spine entry is dropped (unknown id, non-HTML resource,
    /// unreadable file, or empty after normalisation).
    fn on_chapter_skipped(&self, idref: &str, reason: &str) {
        let _ = (idref, reason);
    }

    /// Called once after every spine entry has been attempted.
    fn on_load_complete(&self, spine_len: usize, chapter_count: usize) {
        let _ = (spine_len, chapter_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl LoadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::LoaderConfig`].
pub type ProgressCallback = Arc<dyn LoadProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl LoadProgressCallback for Recorder {
        fn on_load_start(&self, spine_len: usize) {
            self.events.lock().unwrap().push(format!("start {spine_len}"));
        }

        fn on_chapter_loaded(&self, index: usize, title: &str, _text_len: usize) {
            self.events.lock().unwrap().push(format!("loaded {index} {title}"));
        }

        fn on_chapter_skipped(&self, idref: &str, _reason: &str) {
            self.events.lock().unwrap().push(format!("skipped {idref}"));
        }

        fn on_load_complete(&self, spine_len: usize, chapter_count: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {chapter_count}/{spine_len}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_load_start(3);
        cb.on_chapter_loaded(0, "Chapter 1", 10);
        cb.on_chapter_skipped("img1", "not an HTML resource");
        cb.on_load_complete(3, 1);
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_load_start(2);
        rec.on_chapter_loaded(0, "Intro", 5);
        rec.on_chapter_skipped("ch2", "empty after normalisation");
        rec.on_load_complete(2, 1);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start 2", "loaded 0 Intro", "skipped ch2", "done 1/2"]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_load_start(10);
        cb.on_chapter_loaded(0, "x", 1);
    }
}
