//! Per-call batch state: one result slot per item, the progress counter, and the sink.

use log::warn;

use crate::ProcessingResult;
use crate::engine::progress::ProgressSink;
use crate::utils::config::INTERRUPT_MESSAGE;

/// Lives for a single `run` call. Each item's slot is written at most once; every write
/// advances the sink by exactly one.
pub struct BatchSession<'s, Out> {
    slots: Vec<Option<ProcessingResult<Out>>>,
    completed: usize,
    sink: &'s mut dyn ProgressSink,
}

impl<'s, Out> BatchSession<'s, Out> {
    /// Open a session for `total` items and announce it to the sink.
    pub fn begin(total: usize, description: &str, sink: &'s mut dyn ProgressSink) -> Self {
        sink.begin(total, description);
        Self {
            slots: (0..total).map(|_| None).collect(),
            completed: 0,
            sink,
        }
    }

    /// Record the outcome for item `idx` and advance progress. A second record for the same
    /// item is ignored.
    pub fn record(&mut self, idx: usize, result: ProcessingResult<Out>) {
        let Some(slot) = self.slots.get_mut(idx) else {
            warn!("Ignoring result for out-of-range item #{idx}");
            return;
        };
        if slot.is_some() {
            warn!("Ignoring duplicate result for item #{idx}");
            return;
        }
        *slot = Some(result);
        self.completed += 1;
        self.sink.advance(1);
    }

    /// Emit a notice through the sink.
    pub fn write_line(&mut self, text: &str) {
        self.sink.write_line(text);
    }

    /// Emit a per-item failure diagnostic through the sink, immediately.
    pub fn write_error(&mut self, text: &str) {
        self.sink.write_error(text);
    }

    /// Items that reached a terminal state so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.slots.len()
    }

    /// Close the session: every item without a result becomes `Cancelled`, the sink is finished,
    /// and results come back in input order.
    pub fn finish(mut self, interrupted: bool) -> Vec<ProcessingResult<Out>> {
        if interrupted {
            self.sink.write_line(INTERRUPT_MESSAGE);
        }
        let unfinished: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.is_none().then_some(idx))
            .collect();
        for idx in unfinished {
            self.record(idx, ProcessingResult::Cancelled);
        }
        self.sink.finish();
        self.slots
            .into_iter()
            .map(|slot| slot.unwrap_or(ProcessingResult::Cancelled))
            .collect()
    }
}
