//! Lexibatch: bounded-concurrency async batch runner for LLM content-generation jobs

pub mod engine;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{BatchRunner, ProgressSink, RetryPolicy};
pub use tokio_util::sync::CancellationToken;

/// Result alias used by public lexibatch API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

use std::fmt::Debug;
use std::future::Future;

/// Single entry point: run `op` over `items` with `opts` and return one result per item, in order.
///
/// Equivalent to `BatchRunner::new(opts.clone()).run(items, op)`. Use [`BatchRunner`] directly to
/// supply your own cancellation token or [`ProgressSink`].
///
/// ```ignore
/// let opts = lexibatch::RunnerOpts { progress_description: "Generating forbidden words".into(), ..Default::default() };
/// let results = lexibatch::run_batch(&words, &opts, |w| async move { ask_llm(w).await }).await?;
/// println!("{}", lexibatch::BatchSummary::from_results(&results));
/// ```
pub async fn run_batch<'a, In, Out, F, Fut>(
    items: &'a [In],
    opts: &RunnerOpts,
    op: F,
) -> Result<Vec<ProcessingResult<Out>>>
where
    In: Debug,
    F: Fn(&'a In) -> Fut,
    Fut: Future<Output = Result<Out>> + 'a,
{
    BatchRunner::new(opts.clone()).run(items, op).await
}
