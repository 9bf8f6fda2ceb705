//! Engine module: the batch runner and its collaborators

pub mod interrupt;
pub mod progress;
pub mod retry;
pub mod runner;
pub mod session;

// Re-export commonly used items
pub use interrupt::{InterruptGuard, SignalAction, on_signal, register, registered, trigger};
pub use progress::{BarSink, LogSink, NullSink, ProgressBar, ProgressSink};
pub use retry::{RetryPolicy, default_llm_policy};
pub use runner::BatchRunner;
pub use session::BatchSession;
