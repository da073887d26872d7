//! Bounded polling.
//!
//! Calls a predicate until it reports ready, the overall timeout would be
//! exceeded, or the predicate fails. Knows nothing about tables.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{Result, StoreError};

/// How a bounded wait ended.
#[derive(Debug)]
pub enum PollOutcome {
    Succeeded { attempts: u32 },
    TimedOut { attempts: u32, waited: Duration },
    Cancelled { attempts: u32 },
    Errored(StoreError),
}

/// Poll `predicate` until it returns `Ok(true)`.
///
/// The first check happens immediately. A check is only attempted if it
/// would start within `timeout` of the first one, so a predicate that turns
/// ready on call `k + 1` succeeds iff `poll_interval * k <= timeout`.
/// A predicate error ends the wait at once; it is never retried.
pub async fn poll<F, Fut>(
    poll_interval: Duration,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
    mut predicate: F,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        match predicate().await {
            Ok(true) => return PollOutcome::Succeeded { attempts },
            Ok(false) => {}
            Err(e) => return PollOutcome::Errored(e),
        }

        let waited = start.elapsed();
        if waited + poll_interval > timeout {
            return PollOutcome::TimedOut { attempts, waited };
        }

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => return PollOutcome::Cancelled { attempts },
                    _ = sleep(poll_interval) => {}
                }
            }
            None => sleep(poll_interval).await,
        }
    }
}

fn finish(label: &str, outcome: PollOutcome) -> Result<()> {
    match outcome {
        PollOutcome::Succeeded { attempts } => {
            debug!(label, attempts, "wait succeeded");
            Ok(())
        }
        PollOutcome::TimedOut { attempts, waited } => {
            warn!(label, attempts, ?waited, "wait timed out");
            Err(StoreError::Timeout {
                label: label.to_string(),
                waited,
            })
        }
        PollOutcome::Cancelled { attempts } => {
            warn!(label, attempts, "wait cancelled");
            Err(StoreError::Cancelled {
                label: label.to_string(),
            })
        }
        PollOutcome::Errored(e) => Err(e),
    }
}

/// Wait until `predicate` reports ready. See [`poll`] for the timing rules.
///
/// Returns [`StoreError::Timeout`] carrying `label` when time runs out, or
/// the predicate's own error unchanged.
pub async fn wait_until<F, Fut>(
    label: &str,
    predicate: F,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    finish(label, poll(poll_interval, timeout, None, predicate).await)
}

/// Like [`wait_until`], but stops with [`StoreError::Cancelled`] as soon as
/// `cancel` fires while sleeping between checks.
pub async fn wait_until_cancellable<F, Fut>(
    label: &str,
    predicate: F,
    poll_interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    finish(label, poll(poll_interval, timeout, Some(cancel), predicate).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{DatastoreError, DatastoreErrorKind};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const INTERVAL: Duration = Duration::from_secs(3);

    /// Predicate that reports ready on call `k + 1`, i.e. after `k` polls
    /// that said "not yet".
    fn ready_after(k: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<bool>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(n >= k))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_immediately_checks_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = wait_until("ready", ready_after(0, calls.clone()), INTERVAL, INTERVAL * 2).await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_when_k_polls_fit_in_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let timeout = INTERVAL * 4 + Duration::from_millis(1);
        let result = wait_until("fits", ready_after(4, calls.clone()), INTERVAL, timeout).await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_k_polls_exceed_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let timeout = INTERVAL * 4 - Duration::from_millis(1);
        let err = wait_until("table active", ready_after(4, calls.clone()), INTERVAL, timeout)
            .await
            .unwrap_err();
        match err {
            StoreError::Timeout { label, waited } => {
                assert_eq!(label, "table active");
                assert_eq!(waited, INTERVAL * 3);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_longer_than_timeout_checks_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let err = wait_until("degenerate", ready_after(1, calls.clone()), INTERVAL, INTERVAL / 2)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let err = wait_until(
            "failing",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err(StoreError::transport(
                    "describe_table",
                    DatastoreError::new(DatastoreErrorKind::Connection, "down"),
                )))
            },
            INTERVAL,
            INTERVAL * 10,
        )
        .await
        .unwrap_err();
        assert_eq!(err.datastore_kind(), Some(DatastoreErrorKind::Connection));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_between_polls() {
        let calls = Arc::new(AtomicU32::new(0));
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            sleep(INTERVAL + INTERVAL / 2).await;
            trigger.cancel();
        });

        let err = wait_until_cancellable(
            "cancelled",
            ready_after(100, calls.clone()),
            INTERVAL,
            INTERVAL * 100,
            &token,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
