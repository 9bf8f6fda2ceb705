//! Ctrl+C path: a registered batch is cancelled through the process-wide interrupt target.
//! Kept in its own test binary so no other batch competes for the registration.

use lexibatch::engine::{NullSink, SignalAction, on_signal, registered, trigger};
use lexibatch::{BatchRunner, ProcessingResult, RunnerOpts};
use std::time::Duration;

#[tokio::test]
async fn test_interrupt_cancels_registered_batch() {
    assert!(!trigger(), "nothing registered before the batch starts");

    let runner = BatchRunner::new(RunnerOpts {
        max_concurrency: 2,
        show_progress: false,
        handle_interrupt: true,
        ..Default::default()
    });
    let items = [0, 1, 2];
    let results = runner
        .run_with_sink(
            &items,
            |x| async move {
                if *x == 0 {
                    return Ok(*x);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert!(trigger());
                std::future::pending::<anyhow::Result<i32>>().await
            },
            &mut NullSink,
        )
        .await
        .unwrap();

    assert_eq!(
        results,
        vec![
            ProcessingResult::Success { value: 0 },
            ProcessingResult::Cancelled,
            ProcessingResult::Cancelled,
        ]
    );
    assert!(!trigger(), "guard is released when the batch returns");
    assert_eq!(registered(), 0);
    assert_eq!(
        on_signal(),
        SignalAction::Exit,
        "Ctrl+C outside a batch falls back to exiting"
    );
    assert!(
        !runner.cancel_token().is_cancelled(),
        "an interrupt stops the session, not the runner"
    );
}
