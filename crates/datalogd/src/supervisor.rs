//! Supervised retry loop.
//!
//! Runs a cancellable fallible operation repeatedly with a fixed cooldown
//! after each failure, until the cancellation token fires. The interval is
//! deliberately fixed rather than growing: the target is a single
//! always-reconnectable local device, not a congested remote service.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Run `operation` until `cancel` fires.
///
/// Each attempt receives a child token derived from `cancel`. A failed
/// attempt is logged and followed by `cooldown`; a successful return (for
/// example a clean stream end) retries immediately, since any exit is
/// treated as transient. The cooldown itself races against cancellation,
/// so shutdown never waits out a pending delay.
///
/// Returns only after cancellation has been observed; callers await the
/// surrounding task handle to confirm full termination.
pub async fn supervise<F, Fut, E>(cancel: CancellationToken, cooldown: Duration, mut operation: F)
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: fmt::Display,
{
    while !cancel.is_cancelled() {
        if let Err(e) = operation(cancel.child_token()).await {
            if cancel.is_cancelled() {
                // The failure is the cancellation surfacing; no cooldown.
                break;
            }
            error!(error = %e, cooldown_ms = cooldown.as_millis() as u64, "supervised operation failed, retrying after cooldown");
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(cooldown) => {}
            }
        }
    }

    debug!("supervisor stopped");
}
