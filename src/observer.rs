//! Observability sink for crawl events
//!
//! The crawler and the backoff supervisor report what happens to each visit
//! through a [`CrawlObserver`] instead of logging directly, so callers choose
//! where events go. [`TracingObserver`] forwards them to `tracing`;
//! [`RecordingObserver`] keeps them in memory.

use crate::backoff::FailureKind;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Receiver of crawl events
///
/// Every method has an empty default so implementors pick what they need.
pub trait CrawlObserver: Send + Sync {
    fn visit_started(&self, _url: &Url) {}

    fn visit_succeeded(&self, _url: &Url, _anchors: usize) {}

    /// The body was cut at `limit` bytes; anchors after it were not seen
    fn visit_truncated(&self, _url: &Url, _limit: usize) {}

    fn visit_failed(&self, _url: &Url, _kind: FailureKind, _error: &str) {}

    fn retry_attempt(&self, _url: &Url, _kind: FailureKind, _attempt: u32) {}

    fn retry_recovered(&self, _url: &Url, _kind: FailureKind, _attempts: u32) {}

    fn retry_abandoned(&self, _url: &Url, _kind: FailureKind, _attempts: u32, _error: &str) {}

    fn crawl_finished(&self, _matches: usize, _elapsed: Duration) {}
}

/// Observer that logs every event with `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn visit_started(&self, url: &Url) {
        tracing::debug!("Visiting {}", url);
    }

    fn visit_succeeded(&self, url: &Url, anchors: usize) {
        tracing::trace!("Visited {} ({} anchors)", url, anchors);
    }

    fn visit_truncated(&self, url: &Url, limit: usize) {
        tracing::debug!("Body of {} truncated at {} bytes", url, limit);
    }

    fn visit_failed(&self, url: &Url, kind: FailureKind, error: &str) {
        if kind.is_transient() {
            tracing::warn!("Visit to {} failed ({}): {}", url, kind, error);
        } else {
            tracing::error!("Visit to {} failed: {}", url, error);
        }
    }

    fn retry_attempt(&self, url: &Url, kind: FailureKind, attempt: u32) {
        tracing::debug!("Retrying {} after {} (attempt {})", url, kind, attempt);
    }

    fn retry_recovered(&self, url: &Url, kind: FailureKind, attempts: u32) {
        tracing::info!("Recovered {} from {} after {} attempts", url, kind, attempts);
    }

    fn retry_abandoned(&self, url: &Url, kind: FailureKind, attempts: u32, error: &str) {
        tracing::warn!(
            "Giving up on {} after {} attempts ({}): {}",
            url,
            attempts,
            kind,
            error
        );
    }

    fn crawl_finished(&self, matches: usize, elapsed: Duration) {
        tracing::info!("Crawl completed: {} matches in {:?}", matches, elapsed);
    }
}

/// A crawl event as captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    VisitStarted(Url),
    VisitSucceeded { url: Url, anchors: usize },
    VisitTruncated { url: Url, limit: usize },
    VisitFailed { url: Url, kind: FailureKind },
    RetryAttempt { url: Url, kind: FailureKind, attempt: u32 },
    RetryRecovered { url: Url, kind: FailureKind, attempts: u32 },
    RetryAbandoned { url: Url, kind: FailureKind, attempts: u32 },
    CrawlFinished { matches: usize },
}

/// Observer that records events in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// URLs of every visit started, in order
    pub fn visited(&self) -> Vec<Url> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::VisitStarted(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl CrawlObserver for RecordingObserver {
    fn visit_started(&self, url: &Url) {
        self.push(ObservedEvent::VisitStarted(url.clone()));
    }

    fn visit_succeeded(&self, url: &Url, anchors: usize) {
        self.push(ObservedEvent::VisitSucceeded {
            url: url.clone(),
            anchors,
        });
    }

    fn visit_truncated(&self, url: &Url, limit: usize) {
        self.push(ObservedEvent::VisitTruncated {
            url: url.clone(),
            limit,
        });
    }

    fn visit_failed(&self, url: &Url, kind: FailureKind, _error: &str) {
        self.push(ObservedEvent::VisitFailed {
            url: url.clone(),
            kind,
        });
    }

    fn retry_attempt(&self, url: &Url, kind: FailureKind, attempt: u32) {
        self.push(ObservedEvent::RetryAttempt {
            url: url.clone(),
            kind,
            attempt,
        });
    }

    fn retry_recovered(&self, url: &Url, kind: FailureKind, attempts: u32) {
        self.push(ObservedEvent::RetryRecovered {
            url: url.clone(),
            kind,
            attempts,
        });
    }

    fn retry_abandoned(&self, url: &Url, kind: FailureKind, attempts: u32, _error: &str) {
        self.push(ObservedEvent::RetryAbandoned {
            url: url.clone(),
            kind,
            attempts,
        });
    }

    fn crawl_finished(&self, matches: usize, _elapsed: Duration) {
        self.push(ObservedEvent::CrawlFinished { matches });
    }
}
