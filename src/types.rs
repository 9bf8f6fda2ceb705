//! Public types for the lexibatch API: per-item results, batch summary, runner options.

use serde::{Deserialize, Serialize};

use crate::utils::config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PROGRESS_DESCRIPTION};

/// Outcome of processing one input item. A batch returns exactly one per item, in input order.
///
/// Serializes as an internally tagged object: `{"status": "success", "value": ...}`,
/// `{"status": "error", "error": "..."}` or `{"status": "cancelled"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessingResult<Out> {
    /// The operation completed and returned `value`.
    Success { value: Out },
    /// The operation failed (returned `Err` or panicked). `message` is the error with its cause chain.
    Error {
        #[serde(rename = "error")]
        message: String,
    },
    /// Aborted by a batch-level interruption, either before it started or while it was running.
    Cancelled,
}

impl<Out> ProcessingResult<Out> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Borrow the success value, if any.
    pub fn value(&self) -> Option<&Out> {
        match self {
            Self::Success { value } => Some(value),
            _ => None,
        }
    }

    /// Take the success value, if any.
    pub fn into_value(self) -> Option<Out> {
        match self {
            Self::Success { value } => Some(value),
            _ => None,
        }
    }

    /// Error message, if the item failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Map the success value; errors and cancellations pass through unchanged.
    pub fn map<U, F>(self, f: F) -> ProcessingResult<U>
    where
        F: FnOnce(Out) -> U,
    {
        match self {
            Self::Success { value } => ProcessingResult::Success { value: f(value) },
            Self::Error { message } => ProcessingResult::Error { message },
            Self::Cancelled => ProcessingResult::Cancelled,
        }
    }
}

/// Counts of each outcome across a finished batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_results<Out>(results: &[ProcessingResult<Out>]) -> Self {
        results.iter().fold(
            Self {
                total: results.len(),
                ..Self::default()
            },
            |mut acc, r| {
                match r {
                    ProcessingResult::Success { .. } => acc.succeeded += 1,
                    ProcessingResult::Error { .. } => acc.failed += 1,
                    ProcessingResult::Cancelled => acc.cancelled += 1,
                }
                acc
            },
        )
    }

    /// True when every item succeeded (nothing failed, nothing was cancelled).
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} items: {} succeeded, {} failed, {} cancelled",
            self.total, self.succeeded, self.failed, self.cancelled
        )
    }
}

/// Options for [`BatchRunner`](crate::engine::BatchRunner).
///
/// Build with [`Default`] and override fields, or layer a settings file and env vars with
/// [`RunnerOpts::load`](crate::utils::settings_toml).
#[derive(Clone, Debug)]
pub struct RunnerOpts {
    /// Upper bound on operations in flight at once. Must be positive.
    pub max_concurrency: usize,
    /// Label shown next to the progress counter.
    pub progress_description: String,
    /// Draw a kdam progress bar on stderr. When false, progress and diagnostics go to the log.
    pub show_progress: bool,
    /// Register the batch for Ctrl+C so an interrupt cancels it instead of killing the process.
    pub handle_interrupt: bool,
}

impl Default for RunnerOpts {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            progress_description: DEFAULT_PROGRESS_DESCRIPTION.to_string(),
            show_progress: true,
            handle_interrupt: true,
        }
    }
}
