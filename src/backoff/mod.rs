//! Retry supervision for transient network failures
//!
//! A failed visit is classified into a [`FailureKind`]. Each transient kind
//! may carry its own [`BackoffSpec`]; when one is configured the
//! [`supervise`] loop re-runs the visit on an exponential schedule with
//! jitter until it succeeds or the elapsed-time budget runs out.

mod classify;
mod clock;
mod schedule;
mod supervisor;

pub use classify::{classify, FailureKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use schedule::{BackoffSpec, ExponentialBackoff, DEFAULT_MULTIPLIER, DEFAULT_RANDOMIZATION_FACTOR};
pub use supervisor::{supervise, Supervised};
