//! Retry loop: re-run a failed operation on a backoff schedule.

use crate::backoff::classify::FailureKind;
use crate::backoff::schedule::BackoffSpec;
use crate::observer::CrawlObserver;
use std::fmt::Display;
use std::future::Future;
use tokio::time::{sleep_until, Instant};
use url::Url;

/// Outcome of supervising a failed operation
#[derive(Debug, PartialEq, Eq)]
pub enum Supervised<T> {
    /// A retry succeeded
    Recovered { value: T, attempts: u32 },
    /// Every retry failed until the schedule ran out
    Abandoned { attempts: u32 },
    /// No backoff is configured for the failure kind
    NotRetried,
}

/// Retries an operation that failed with `kind`
///
/// Without a spec the failure is only reported. Otherwise the first retry
/// runs immediately and later ones follow the exponential schedule. Ticks are
/// spaced from the previous tick, not from the end of the previous retry, so
/// a retry that is slow to fail can be followed by the next one right away;
/// the elapsed-time limit is what bounds the loop. Exhaustion is reported to
/// the observer and returned, never raised.
pub async fn supervise<T, E, F, Fut>(
    url: &Url,
    kind: FailureKind,
    spec: Option<&BackoffSpec>,
    observer: &dyn CrawlObserver,
    mut retry: F,
) -> Supervised<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let spec = match spec {
        Some(spec) if kind.is_transient() => spec,
        _ => return Supervised::NotRetried,
    };

    let mut schedule = spec.schedule();
    let mut next_tick = Instant::now();
    let mut attempts = 0u32;

    loop {
        sleep_until(next_tick).await;

        // The next tick is fixed when this one fires.
        let delay = schedule.next_backoff();

        attempts += 1;
        observer.retry_attempt(url, kind, attempts);

        match retry().await {
            Ok(value) => {
                observer.retry_recovered(url, kind, attempts);
                return Supervised::Recovered { value, attempts };
            }
            Err(e) => match delay {
                Some(delay) => next_tick += delay,
                None => {
                    observer.retry_abandoned(url, kind, attempts, &e.to_string());
                    return Supervised::Abandoned { attempts };
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{ObservedEvent, RecordingObserver};
    use std::sync::Mutex;
    use std::time::Duration;

    fn url() -> Url {
        Url::parse("http://example.com/pub/").unwrap()
    }

    fn spec(initial_ms: u64, max_ms: u64, elapsed_ms: u64) -> BackoffSpec {
        BackoffSpec::new(
            Duration::from_millis(initial_ms),
            Duration::from_millis(max_ms),
            Duration::from_millis(elapsed_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_failures() {
        let observer = RecordingObserver::new();
        let spec = spec(100, 1_000, 60_000).with_randomization_factor(0.0);
        let calls = Mutex::new(Vec::new());

        let outcome = supervise(
            &url(),
            FailureKind::ConnectionReset,
            Some(&spec),
            &observer,
            || {
                let mut calls = calls.lock().unwrap();
                calls.push(Instant::now());
                let n = calls.len();
                async move {
                    if n < 3 {
                        Err("connection reset")
                    } else {
                        Ok(n)
                    }
                }
            },
        )
        .await;

        assert_eq!(outcome, Supervised::Recovered { value: 3, attempts: 3 });

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert_eq!(first_gap, Duration::from_millis(100));
        assert_eq!(second_gap, Duration::from_millis(150));
        assert!(second_gap >= first_gap);

        let events = observer.events();
        assert_eq!(
            events.last(),
            Some(&ObservedEvent::RetryRecovered {
                url: url(),
                kind: FailureKind::ConnectionReset,
                attempts: 3,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_gaps_never_exceed_max_interval_with_jitter() {
        let observer = RecordingObserver::new();
        let spec = spec(100, 200, 60_000);
        let calls = Mutex::new(Vec::new());

        let outcome = supervise(&url(), FailureKind::ConnectionTimedOut, Some(&spec), &observer, || {
            let mut calls = calls.lock().unwrap();
            calls.push(Instant::now());
            let n = calls.len();
            async move { if n < 8 { Err("timeout") } else { Ok(()) } }
        })
        .await;

        assert_eq!(outcome, Supervised::Recovered { value: (), attempts: 8 });
        let calls = calls.into_inner().unwrap();
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] <= Duration::from_millis(300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandons_within_elapsed_bound() {
        let observer = RecordingObserver::new();
        let spec = spec(100, 200, 1_000);
        let start = Instant::now();
        let mut last_call = start;

        let outcome: Supervised<()> = supervise(
            &url(),
            FailureKind::ContextDeadlineExceeded,
            Some(&spec),
            &observer,
            || {
                last_call = Instant::now();
                async { Err("deadline exceeded") }
            },
        )
        .await;

        let attempts = match outcome {
            Supervised::Abandoned { attempts } => attempts,
            other => panic!("expected abandonment, got {:?}", other),
        };
        assert!(attempts > 1);
        assert!(last_call - start <= Duration::from_millis(1_000));
        assert!(matches!(
            observer.events().last(),
            Some(ObservedEvent::RetryAbandoned { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_retries_run_back_to_back() {
        let observer = RecordingObserver::new();
        let spec = spec(10, 10, 60_000).with_randomization_factor(0.0);
        let calls = Mutex::new(Vec::new());

        supervise(&url(), FailureKind::ConnectionReset, Some(&spec), &observer, || {
            let mut calls = calls.lock().unwrap();
            calls.push(Instant::now());
            let n = calls.len();
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if n < 3 { Err("reset") } else { Ok(()) }
            }
        })
        .await;

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 3);
        // Each retry took longer than the tick spacing, so the next one
        // started as soon as the previous one failed.
        assert_eq!(calls[1] - calls[0], Duration::from_millis(50));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_no_spec_means_no_retry() {
        let observer = RecordingObserver::new();
        let mut called = false;

        let outcome: Supervised<()> =
            supervise(&url(), FailureKind::ConnectionReset, None, &observer, || {
                called = true;
                async { Err("reset") }
            })
            .await;

        assert_eq!(outcome, Supervised::NotRetried);
        assert!(!called);
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_other_failures_never_retried() {
        let observer = RecordingObserver::new();
        let spec = spec(10, 10, 1_000);

        let outcome: Supervised<()> =
            supervise(&url(), FailureKind::Other, Some(&spec), &observer, || async {
                Err("404 Not Found")
            })
            .await;

        assert_eq!(outcome, Supervised::NotRetried);
    }
}
