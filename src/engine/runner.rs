//! Bounded-concurrency batch runner.
//!
//! Every item's future lives in one `FuturesUnordered` polled by the `run` future itself, so the
//! operation's futures need not be `Send` and may borrow the items. A semaphore permit is taken
//! before the operation is invoked and released when its future completes or is dropped.

use anyhow::{Result, anyhow, ensure};
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use std::any::Any;
use std::fmt::Debug;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::engine::interrupt;
use crate::engine::progress::{BarSink, LogSink, ProgressSink};
use crate::engine::session::BatchSession;
use crate::{BatchSummary, ProcessingResult, RunnerOpts};

/// Maps an async operation over a slice with a concurrency cap, per-item fault isolation and
/// cancellation that keeps completed work.
///
/// ```ignore
/// let runner = BatchRunner::new(RunnerOpts { max_concurrency: 8, ..Default::default() });
/// let results = runner.run(&words, |word| generate_taboo_words(word)).await?;
/// ```
#[derive(Clone, Debug)]
pub struct BatchRunner {
    opts: RunnerOpts,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(opts: RunnerOpts) -> Self {
        Self {
            opts,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` as the external stop signal. Cancelling it interrupts the running batch and
    /// every later one.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn opts(&self) -> &RunnerOpts {
        &self.opts
    }

    /// Clone of the external stop signal.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `op` over `items`, reporting to a kdam bar (or the log when `show_progress` is off).
    pub async fn run<'a, In, Out, F, Fut>(
        &self,
        items: &'a [In],
        op: F,
    ) -> Result<Vec<ProcessingResult<Out>>>
    where
        In: Debug,
        F: Fn(&'a In) -> Fut,
        Fut: Future<Output = Result<Out>> + 'a,
    {
        if self.opts.show_progress {
            self.run_with_sink(items, op, &mut BarSink::new()).await
        } else {
            self.run_with_sink(items, op, &mut LogSink::new()).await
        }
    }

    /// Run `op` over `items`, reporting progress and diagnostics to `sink`.
    ///
    /// Returns one result per item in input order. Fails only when `max_concurrency` is zero;
    /// item failures and interruption are reported inside the results.
    pub async fn run_with_sink<'a, In, Out, F, Fut>(
        &self,
        items: &'a [In],
        op: F,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<ProcessingResult<Out>>>
    where
        In: Debug,
        F: Fn(&'a In) -> Fut,
        Fut: Future<Output = Result<Out>> + 'a,
    {
        let max_concurrency = self.opts.max_concurrency;
        ensure!(
            max_concurrency > 0,
            "max_concurrency must be at least 1, got {}",
            max_concurrency
        );
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let session_token = self.cancel.child_token();
        let _interrupt_guard = self
            .opts
            .handle_interrupt
            .then(|| interrupt::register(&session_token));

        debug!(
            "Starting batch of {} items, max_concurrency={}",
            items.len(),
            max_concurrency
        );
        let mut session = BatchSession::begin(items.len(), &self.opts.progress_description, sink);

        let gate = Semaphore::new(max_concurrency);
        let op = &op;
        let gate = &gate;
        let mut in_flight: FuturesUnordered<_> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| async move {
                let outcome = match gate.acquire().await {
                    Ok(_permit) => invoke(op, item).await,
                    Err(e) => Err(anyhow!("concurrency gate closed: {e}")),
                };
                (idx, item, outcome)
            })
            .collect();

        let mut interrupted = false;
        loop {
            tokio::select! {
                biased;
                _ = session_token.cancelled() => {
                    interrupted = true;
                    break;
                }
                next = in_flight.next() => match next {
                    Some((idx, _, Ok(value))) => {
                        session.record(idx, ProcessingResult::Success { value });
                    }
                    Some((idx, item, Err(err))) => {
                        session.write_error(&format!("Error processing item #{idx} {item:?}:\n{err:?}"));
                        session.record(idx, ProcessingResult::Error { message: format!("{err:#}") });
                    }
                    None => break,
                },
            }
        }
        // Dropping the remaining futures stops in-flight operations and releases their permits.
        drop(in_flight);

        if interrupted {
            warn!(
                "Batch interrupted after {}/{} items; the rest are cancelled",
                session.completed(),
                session.total()
            );
        }
        let results = session.finish(interrupted);
        debug!("Batch finished: {}", BatchSummary::from_results(&results));
        Ok(results)
    }
}

/// Invoke `op` on one item, turning a panic into an error for that item alone.
async fn invoke<'a, In, Out, F, Fut>(op: &F, item: &'a In) -> Result<Out>
where
    F: Fn(&'a In) -> Fut,
    Fut: Future<Output = Result<Out>> + 'a,
{
    match AssertUnwindSafe(async { op(item).await }).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(anyhow!("operation panicked: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
