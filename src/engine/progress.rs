//! Progress sinks: where a batch reports its counter and per-item diagnostics.

use kdam::{Animation, Bar, BarExt};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};

/// Display/log sink injected into a batch. The runner calls `begin` once, `advance(1)` per item
/// reaching a terminal state, `write_error` as soon as an item fails, `write_line` for other
/// notices, and `finish` once at the end.
pub trait ProgressSink {
    fn begin(&mut self, total: usize, description: &str);
    fn advance(&mut self, by: usize);
    fn write_line(&mut self, text: &str);
    fn finish(&mut self);

    /// Per-item failure diagnostic. Defaults to `write_line`.
    fn write_error(&mut self, text: &str) {
        self.write_line(text);
    }
}

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig<'a> {
    pub total: usize,
    pub desc: &'a str,
    pub animation: Animation,
}

impl<'a> ProgressBarConfig<'a> {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'a str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig<'_>) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " items"
    )))
}

/// Advance the bar by `n`. Blocks on the lock: every completed item must be counted.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    let mut bar = pb.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = bar.update(n);
}

/// Print a line above the bar without breaking its rendering.
pub fn write_above_bar(pb: &ProgressBar, text: &str) {
    let mut bar = pb.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = bar.write(text);
}

/// kdam progress bar on stderr.
///
/// The bar is created on `begin`; [`BarSink::handle`] gives operations a clone so they can
/// print above it while the batch runs.
#[derive(Default)]
pub struct BarSink {
    bar: Option<ProgressBar>,
}

impl BarSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the live bar (None before `begin`).
    pub fn handle(&self) -> Option<ProgressBar> {
        self.bar.as_ref().map(Arc::clone)
    }
}

impl ProgressSink for BarSink {
    fn begin(&mut self, total: usize, description: &str) {
        self.bar = Some(create_progress_bar(ProgressBarConfig::new(
            total,
            description,
            Animation::Classic,
        )));
    }

    fn advance(&mut self, by: usize) {
        if let Some(bar) = &self.bar {
            update_progress_bar(bar, by);
        }
    }

    fn write_line(&mut self, text: &str) {
        match &self.bar {
            Some(bar) => write_above_bar(bar, text),
            None => eprintln!("{text}"),
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            let mut bar = bar.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = bar.refresh();
            eprintln!();
        }
    }
}

/// Sink for headless runs: counts progress, sends diagnostics to the log.
#[derive(Debug, Default)]
pub struct LogSink {
    description: String,
    total: usize,
    done: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(&self) -> usize {
        self.done
    }
}

impl ProgressSink for LogSink {
    fn begin(&mut self, total: usize, description: &str) {
        self.description = description.to_string();
        self.total = total;
        self.done = 0;
        info!("{}: {} items", self.description, total);
    }

    fn advance(&mut self, by: usize) {
        self.done += by;
        debug!("{}: {}/{}", self.description, self.done, self.total);
    }

    fn write_line(&mut self, text: &str) {
        info!("{}", text);
    }

    fn write_error(&mut self, text: &str) {
        warn!("{}", text);
    }

    fn finish(&mut self) {
        info!("{}: finished {}/{}", self.description, self.done, self.total);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn begin(&mut self, _total: usize, _description: &str) {}
    fn advance(&mut self, _by: usize) {}
    fn write_line(&mut self, _text: &str) {}
    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_counts() {
        let mut sink = LogSink::new();
        sink.begin(3, "Testing");
        sink.advance(1);
        sink.advance(1);
        sink.write_line("diagnostic");
        sink.write_error("Error processing item #1");
        sink.finish();
        assert_eq!(sink.done(), 2);
    }

    #[test]
    fn test_bar_sink_handle_only_after_begin() {
        let mut sink = BarSink::new();
        assert!(sink.handle().is_none());
        sink.begin(2, "Testing");
        let handle = sink.handle().unwrap();
        sink.advance(1);
        write_above_bar(&handle, "from an operation");
        sink.advance(1);
        sink.finish();
        assert!(sink.handle().is_none());
    }
}
