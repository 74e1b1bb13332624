/// Visit state definitions for tracking crawl progress
use crate::backoff::FailureKind;
use crate::WfindError;
use std::fmt;
use url::Url;

/// Represents the current state of one visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitOutcome {
    /// Submitted to the fetcher, no response yet
    Pending,

    /// The page was fetched and its anchors handed over
    Succeeded,

    /// The fetch failed; retries may still recover it
    Failed(FailureKind),
}

impl VisitOutcome {
    /// Returns true if no further transition is expected without a retry
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if moving to `next` is allowed
    ///
    /// Pending may end either way; a failure may be recovered by a retry.
    pub fn can_transition_to(&self, next: VisitOutcome) -> bool {
        match (self, next) {
            (Self::Pending, Self::Succeeded | Self::Failed(_)) => true,
            (Self::Failed(_), Self::Succeeded | Self::Failed(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "failed ({})", kind),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One URL submitted for visiting and what became of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    url: Url,
    is_seed: bool,
    outcome: VisitOutcome,
}

impl VisitRecord {
    /// Record for the first visit of a seed
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            is_seed: true,
            outcome: VisitOutcome::Pending,
        }
    }

    /// Record for a directory discovered during the crawl
    pub fn child(url: Url) -> Self {
        Self {
            url,
            is_seed: false,
            outcome: VisitOutcome::Pending,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_seed(&self) -> bool {
        self.is_seed
    }

    pub fn outcome(&self) -> VisitOutcome {
        self.outcome
    }

    pub fn succeed(&mut self) -> Result<(), WfindError> {
        self.transition(VisitOutcome::Succeeded)
    }

    pub fn fail(&mut self, kind: FailureKind) -> Result<(), WfindError> {
        self.transition(VisitOutcome::Failed(kind))
    }

    fn transition(&mut self, next: VisitOutcome) -> Result<(), WfindError> {
        if !self.outcome.can_transition_to(next) {
            return Err(WfindError::InvalidTransition {
                url: self.url.to_string(),
                from: self.outcome,
                to: next,
            });
        }

        tracing::trace!("Visit {}: {} -> {}", self.url, self.outcome, next);
        self.outcome = next;
        Ok(())
    }
}
