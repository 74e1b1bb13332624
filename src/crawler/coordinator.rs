//! Crawler coordinator - main traversal logic
//!
//! This module drives a find job from its seeds to completion:
//! - Visiting every seed and the directories discovered below it
//! - Handing failed visits to the backoff supervisor
//! - Classifying anchors and recording matches
//! - Waiting for every outstanding visit before returning

use crate::backoff::{supervise, Supervised};
use crate::config::{ConcurrencyMode, Policy};
use crate::crawler::classifier::classify_link;
use crate::crawler::fetcher::{FetchError, Fetcher, Page};
use crate::crawler::parser::{extract_anchors, Anchor};
use crate::observer::CrawlObserver;
use crate::output::{FindResult, ResultAccumulator};
use crate::state::VisitRecord;
use crate::{Result, WfindError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, AbortHandle, JoinSet};
use tokio::time::Instant;
use url::Url;

/// Main crawler coordinator structure
///
/// Cheap to clone; every clone shares the same policy, fetcher, observer
/// and results.
#[derive(Clone)]
pub struct Coordinator {
    policy: Arc<Policy>,
    fetcher: Arc<dyn Fetcher>,
    observer: Arc<dyn CrawlObserver>,
    results: Arc<ResultAccumulator>,
}

impl Coordinator {
    pub fn new(
        policy: Arc<Policy>,
        fetcher: Arc<dyn Fetcher>,
        observer: Arc<dyn CrawlObserver>,
    ) -> Self {
        Self {
            policy,
            fetcher,
            observer,
            results: Arc::new(ResultAccumulator::new()),
        }
    }

    /// Runs the traversal until every visit has finished
    ///
    /// # Returns
    ///
    /// * `Ok(FindResult)` - All matches, or those found before the crawl
    ///   timeout fired
    /// * `Err(WfindError::Crawl)` - A seed could not be fetched even after
    ///   retries
    pub async fn run(&self) -> Result<FindResult> {
        let started = Instant::now();
        tracing::info!(
            "Finding {} entries matching {} under {} seed(s) ({:?})",
            self.policy.entry_type(),
            self.policy.name_pattern(),
            self.policy.seeds().len(),
            self.policy.concurrency()
        );

        let traversal = async {
            match self.policy.concurrency() {
                ConcurrencyMode::Sequential => self.run_sequential().await,
                ConcurrencyMode::Concurrent => self.run_concurrent().await,
            }
        };

        match self.policy.crawl_timeout() {
            Some(limit) => match tokio::time::timeout(limit, traversal).await {
                Ok(outcome) => outcome?,
                Err(_) => tracing::warn!(
                    "Crawl timeout of {:?} reached, returning partial results",
                    limit
                ),
            },
            None => traversal.await?,
        }

        let result = self.results.snapshot();
        self.observer.crawl_finished(result.len(), started.elapsed());
        Ok(result)
    }

    /// Depth-first traversal in a single task
    ///
    /// Each directory is fully visited as soon as its anchor is seen, before
    /// the next anchor of the same listing is looked at.
    async fn run_sequential(&self) -> Result<()> {
        for seed in self.policy.seeds() {
            let anchors = self.visit_seed(seed).await?;
            let mut listings = vec![anchors.into_iter()];

            while let Some(listing) = listings.last_mut() {
                let anchor = match listing.next() {
                    Some(anchor) => anchor,
                    None => {
                        listings.pop();
                        continue;
                    }
                };

                if let Some(next) = self.handle_anchor(&anchor) {
                    if let Some(children) = self.visit_child(next).await {
                        listings.push(children.into_iter());
                    }
                }
            }
        }

        Ok(())
    }

    /// Traversal with one task per visit
    ///
    /// Visits submit the directories they discover over a channel and the
    /// loop spawns them right away. The `JoinSet` is the completion barrier:
    /// the traversal ends when it is empty and nothing is left to submit.
    /// A seed visit that panics or is cancelled fails the run like a seed
    /// fetch error does; any other lost visit is logged and skipped.
    async fn run_concurrent(&self) -> Result<()> {
        let (submit, mut submissions) = mpsc::unbounded_channel::<Url>();
        let mut in_flight: JoinSet<Result<()>> = JoinSet::new();
        let mut seed_tasks: HashMap<task::Id, Url> = HashMap::new();

        for seed in self.policy.seeds() {
            let handle =
                self.spawn_visit(&mut in_flight, VisitRecord::seed(seed.clone()), &submit);
            seed_tasks.insert(handle.id(), seed.clone());
        }

        loop {
            tokio::select! {
                biased;

                Some(url) = submissions.recv() => {
                    self.spawn_visit(&mut in_flight, VisitRecord::child(url), &submit);
                }

                joined = in_flight.join_next() => match joined {
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(e))) => {
                        in_flight.abort_all();
                        return Err(e);
                    }
                    Some(Err(e)) => match seed_tasks.remove(&e.id()) {
                        Some(seed) => {
                            in_flight.abort_all();
                            return Err(WfindError::TaskFailed {
                                url: seed.to_string(),
                                source: e,
                            });
                        }
                        None => tracing::error!("Visit task failed: {}", e),
                    },
                    // Every visit has finished, so every submission is queued.
                    None => match submissions.try_recv() {
                        Ok(url) => {
                            self.spawn_visit(&mut in_flight, VisitRecord::child(url), &submit);
                        }
                        Err(_) => break,
                    },
                },
            }
        }

        Ok(())
    }

    fn spawn_visit(
        &self,
        in_flight: &mut JoinSet<Result<()>>,
        record: VisitRecord,
        submit: &mpsc::UnboundedSender<Url>,
    ) -> AbortHandle {
        let coordinator = self.clone();
        let submit = submit.clone();
        in_flight.spawn(async move { coordinator.visit_and_submit(record, submit).await })
    }

    async fn visit_and_submit(
        &self,
        mut record: VisitRecord,
        submit: mpsc::UnboundedSender<Url>,
    ) -> Result<()> {
        let page = match self.fetch_page(&mut record).await {
            Ok(page) => page,
            Err(source) if record.is_seed() => {
                return Err(WfindError::Crawl {
                    url: record.url().to_string(),
                    source,
                })
            }
            Err(_) => return Ok(()),
        };

        for anchor in self.read_page(&page) {
            if let Some(next) = self.handle_anchor(&anchor) {
                // The receiver is gone only once the crawl was cut short.
                let _ = submit.send(next);
            }
        }

        Ok(())
    }

    async fn visit_seed(&self, seed: &Url) -> Result<Vec<Anchor>> {
        let mut record = VisitRecord::seed(seed.clone());
        match self.fetch_page(&mut record).await {
            Ok(page) => Ok(self.read_page(&page)),
            Err(source) => Err(WfindError::Crawl {
                url: seed.to_string(),
                source,
            }),
        }
    }

    async fn visit_child(&self, url: Url) -> Option<Vec<Anchor>> {
        let mut record = VisitRecord::child(url);
        let page = self.fetch_page(&mut record).await.ok()?;
        Some(self.read_page(&page))
    }

    /// Fetches the record's URL, retrying transient failures
    ///
    /// On abandonment the first error is returned; the observer has already
    /// been told about the last one.
    async fn fetch_page(&self, record: &mut VisitRecord) -> std::result::Result<Page, FetchError> {
        let url = record.url().clone();
        self.observer.visit_started(&url);

        let error = match self.fetcher.fetch(&url).await {
            Ok(page) => {
                log_transition(record.succeed());
                return Ok(page);
            }
            Err(error) => error,
        };

        let kind = error.failure_kind();
        log_transition(record.fail(kind));

        if error.is_refusal() {
            tracing::debug!("Skipping {}", error);
            return Err(error);
        }

        self.observer.visit_failed(&url, kind, &error.to_string());

        let fetcher = self.fetcher.as_ref();
        let target = &url;
        let outcome = supervise(
            &url,
            kind,
            self.policy.backoff_for(kind),
            self.observer.as_ref(),
            move || fetcher.fetch(target),
        )
        .await;

        match outcome {
            Supervised::Recovered { value, .. } => {
                log_transition(record.succeed());
                Ok(value)
            }
            Supervised::Abandoned { .. } | Supervised::NotRetried => Err(error),
        }
    }

    fn read_page(&self, page: &Page) -> Vec<Anchor> {
        if page.truncated {
            self.observer
                .visit_truncated(&page.url, self.policy.max_body_size());
        }

        let anchors = extract_anchors(&page.body, &page.url);
        self.observer.visit_succeeded(&page.url, anchors.len());
        anchors
    }

    /// Records a match, if any, and returns the directory to visit next
    ///
    /// Seeds are never visited again as discovered directories.
    fn handle_anchor(&self, anchor: &Anchor) -> Option<Url> {
        let classification = classify_link(&anchor.href, &anchor.request_url, &self.policy);

        if let Some((name, url)) = classification.matched() {
            self.results.record(name, url.clone());
        }

        let next = classification.descend_url()?;
        if self.policy.is_seed(next) {
            tracing::trace!("Not revisiting seed {}", next);
            return None;
        }

        Some(next.clone())
    }
}

fn log_transition(result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!("{}", e);
    }
}

/// Runs a complete find job with the given collaborators
///
/// # Arguments
///
/// * `policy` - The validated job configuration
/// * `fetcher` - Source of listing pages
/// * `observer` - Receiver of crawl events
pub async fn run_find(
    policy: Arc<Policy>,
    fetcher: Arc<dyn Fetcher>,
    observer: Arc<dyn CrawlObserver>,
) -> Result<FindResult> {
    Coordinator::new(policy, fetcher, observer).run().await
}
