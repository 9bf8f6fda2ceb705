//! Ctrl+C wiring. The process-wide handler is installed once; each running batch registers its
//! session token for the lifetime of an [`InterruptGuard`]. With no batch registered, Ctrl+C
//! ends the process as the default SIGINT action would.

use log::warn;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex, OnceLock, PoisonError};
use tokio_util::sync::CancellationToken;

/// Exit status a shell reports for a process killed by SIGINT.
pub const SIGINT_EXIT_CODE: i32 = 130;

/// Live registrations: id -> session token.
static TARGETS: LazyLock<Mutex<HashMap<u64, CancellationToken>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static HANDLER_INSTALLED: OnceLock<bool> = OnceLock::new();

/// What the handler does with one Ctrl+C.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalAction {
    /// At least one running batch was cancelled.
    CancelledBatches,
    /// Nothing to cancel; the process should exit.
    Exit,
}

/// Removes its own registration on drop; other batches stay registered.
#[must_use = "the batch is only interruptible while the guard is alive"]
pub struct InterruptGuard {
    id: u64,
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        TARGETS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Install the Ctrl+C handler once per process. Returns whether it is in place.
pub fn install_handler() -> bool {
    *HANDLER_INSTALLED.get_or_init(|| match ctrlc::set_handler(|| {
        if on_signal() == SignalAction::Exit {
            std::process::exit(SIGINT_EXIT_CODE);
        }
    }) {
        Ok(()) => true,
        Err(e) => {
            warn!("Ctrl+C handler not installed ({e}); batches can still be cancelled by token");
            false
        }
    })
}

/// Decide and apply the response to one Ctrl+C: cancel every registered batch, or ask for exit.
pub fn on_signal() -> SignalAction {
    if trigger() {
        SignalAction::CancelledBatches
    } else {
        SignalAction::Exit
    }
}

/// Make `token` cancellable by Ctrl+C until the returned guard is dropped.
pub fn register(token: &CancellationToken) -> InterruptGuard {
    install_handler();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    TARGETS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id, token.clone());
    InterruptGuard { id }
}

/// Cancel every registered batch, as Ctrl+C does. Returns false when none is registered.
/// Repeated calls are harmless.
pub fn trigger() -> bool {
    let targets = TARGETS.lock().unwrap_or_else(PoisonError::into_inner);
    for token in targets.values() {
        token.cancel();
    }
    !targets.is_empty()
}

/// Number of batches currently registered.
pub fn registered() -> usize {
    TARGETS.lock().unwrap_or_else(PoisonError::into_inner).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test so registrations from parallel test threads cannot interleave.
    #[test]
    fn test_registration_lifecycle() {
        // Nothing registered: a signal means exit.
        assert_eq!(registered(), 0);
        assert_eq!(on_signal(), SignalAction::Exit);

        let first = CancellationToken::new();
        let second = CancellationToken::new();
        let first_guard = register(&first);
        let second_guard = register(&second);
        assert_eq!(registered(), 2);

        // The newer batch finishing leaves the older one interruptible.
        drop(second_guard);
        assert_eq!(registered(), 1);
        assert_eq!(on_signal(), SignalAction::CancelledBatches);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(trigger());

        drop(first_guard);
        assert_eq!(registered(), 0);
        assert!(!trigger());
        assert_eq!(on_signal(), SignalAction::Exit);

        // Every live registration is cancelled by one signal.
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        let guards = (register(&a), register(&b));
        assert_eq!(on_signal(), SignalAction::CancelledBatches);
        assert!(a.is_cancelled() && b.is_cancelled());
        drop(guards);
        assert_eq!(registered(), 0);
    }
}
