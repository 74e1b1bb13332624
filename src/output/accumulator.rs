use crate::output::FindResult;
use std::sync::Mutex;
use url::Url;

/// Append-only collection of matches shared by all visits of a crawl
///
/// Both vectors are extended under one lock so they never get out of step.
#[derive(Debug, Default)]
pub struct ResultAccumulator {
    inner: Mutex<FindResult>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, base_name: &str, url: Url) {
        tracing::debug!("Found {}", url);
        self.lock().push(base_name, url);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the matches recorded so far
    pub fn snapshot(&self) -> FindResult {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FindResult> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
