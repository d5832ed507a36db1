//! Progress-callback trait for per-file batch conversion events.
//!
//! Pass an implementation to [`crate::convert::convert_folder`] to receive
//! events as each file is planned and converted. The CLI uses it to print
//! `✓`, `✗` and `⊘` lines; library users can forward events to a progress
//! bar, a channel or a log.
//!
//! # Example
//!
//! ```rust
//! use docs2llm::BatchProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, source: &Path, _output: &Path) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{index}/{total}] {}", source.display());
//!     }
//! }
//!
//! let cb = CountingCallback::default();
//! cb.on_file_complete(1, 1, Path::new("a.pdf"), Path::new("a.md"));
//! assert_eq!(cb.done.load(Ordering::SeqCst), 1);
//! ```

use std::path::Path;

/// Called by batch conversion as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed sequentially, but the trait is
/// `Send + Sync` so implementations can be shared across tasks.
///
/// For every file exactly one of `on_file_complete`, `on_file_skipped` or
/// `on_file_error` is called.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before the first file.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before a file is planned.
    ///
    /// # Arguments
    /// * `index`  — 1-indexed position in the batch
    /// * `total`  — number of files in the batch
    /// * `source` — the file about to be converted
    fn on_file_start(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called when a file converted successfully.
    fn on_file_complete(&self, index: usize, total: usize, source: &Path, output: &Path) {
        let _ = (index, total, source, output);
    }

    /// Called when a file was not converted because the request made no
    /// sense for it (validation failure).
    fn on_file_skipped(&self, index: usize, total: usize, source: &Path, reason: &str) {
        let _ = (index, total, source, reason);
    }

    /// Called when conversion of a file failed.
    fn on_file_error(&self, index: usize, total: usize, source: &Path, error: &str) {
        let _ = (index, total, source, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, converted: usize, failed: usize, skipped: usize) {
        let _ = (converted, failed, skipped);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopBatchProgress;

impl BatchProgressCallback for NoopBatchProgress {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        final_converted: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total: usize) {
            self.batch_total.store(total, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _source: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _source: &Path, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _index: usize, _total: usize, _source: &Path, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _source: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, converted: usize, _failed: usize, _skipped: usize) {
            self.final_converted.store(converted, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopBatchProgress;
        cb.on_batch_start(3);
        cb.on_file_start(1, 3, Path::new("a.pdf"));
        cb.on_file_complete(1, 3, Path::new("a.pdf"), Path::new("a.md"));
        cb.on_file_skipped(2, 3, Path::new("b.md"), "already Markdown");
        cb.on_file_error(3, 3, Path::new("c.bin"), "unsupported");
        cb.on_batch_complete(1, 1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);

        tracker.on_file_start(1, 3, Path::new("a.pdf"));
        tracker.on_file_complete(1, 3, Path::new("a.pdf"), Path::new("a.md"));
        tracker.on_file_start(2, 3, Path::new("b.md"));
        tracker.on_file_skipped(2, 3, Path::new("b.md"), "already Markdown");
        tracker.on_file_start(3, 3, Path::new("c.bin"));
        tracker.on_file_error(3, 3, Path::new("c.bin"), "unsupported");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_batch_complete(1, 1, 1);
        assert_eq!(tracker.final_converted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopBatchProgress);
        cb.on_batch_start(10);
        cb.on_file_start(1, 10, Path::new("x.txt"));
    }
}
