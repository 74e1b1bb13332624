use crate::backoff::clock::{Clock, SystemClock};
use crate::config::BackoffOptions;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Growth factor between consecutive intervals
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Jitter applied to each interval, as a fraction of the interval
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;

/// Tunable parameters of the retry schedule for one failure kind
#[derive(Clone)]
pub struct BackoffSpec {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Zero disables the elapsed-time limit
    pub max_elapsed_time: Duration,
    pub randomization_factor: f64,
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for BackoffSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffSpec")
            .field("initial_interval", &self.initial_interval)
            .field("max_interval", &self.max_interval)
            .field("max_elapsed_time", &self.max_elapsed_time)
            .field("randomization_factor", &self.randomization_factor)
            .finish_non_exhaustive()
    }
}

impl BackoffSpec {
    pub fn new(initial_interval: Duration, max_interval: Duration, max_elapsed_time: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            max_elapsed_time,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_options(options: &BackoffOptions) -> Self {
        Self::new(
            options.initial_interval(),
            options.max_interval(),
            options.max_elapsed_time(),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_randomization_factor(mut self, factor: f64) -> Self {
        self.randomization_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Starts a fresh schedule; elapsed time is counted from now
    pub fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self)
    }
}

/// Exponential backoff schedule with jitter
///
/// `interval(n+1) = min(interval(n) * multiplier, max_interval)`, starting at
/// the initial interval. Each returned delay is the current interval
/// randomized by `± randomization_factor`.
#[derive(Debug)]
pub struct ExponentialBackoff {
    current_interval: Duration,
    max_interval: Duration,
    max_elapsed_time: Duration,
    multiplier: f64,
    randomization_factor: f64,
    clock: Arc<dyn Clock>,
    start: Instant,
}

impl ExponentialBackoff {
    fn new(spec: &BackoffSpec) -> Self {
        Self {
            current_interval: spec.initial_interval,
            max_interval: spec.max_interval,
            max_elapsed_time: spec.max_elapsed_time,
            multiplier: DEFAULT_MULTIPLIER,
            randomization_factor: spec.randomization_factor,
            start: spec.clock.now(),
            clock: spec.clock.clone(),
        }
    }

    /// The interval the next delay is derived from, before jitter
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Time since the schedule started, according to its clock
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start)
    }

    /// Returns the next delay, or `None` once waiting it would run past the
    /// elapsed-time limit
    pub fn next_backoff(&mut self) -> Option<Duration> {
        let delay = randomize(
            self.current_interval,
            self.randomization_factor,
            rand::thread_rng().gen::<f64>(),
        );

        if !self.max_elapsed_time.is_zero() && self.elapsed() + delay > self.max_elapsed_time {
            return None;
        }

        self.increment();
        Some(delay)
    }

    fn increment(&mut self) {
        let next = (self.current_interval.as_nanos() as f64 * self.multiplier).round() as u64;
        self.current_interval = Duration::from_nanos(next).min(self.max_interval);
    }
}

/// Picks a delay in `[interval - factor * interval, interval + factor * interval]`
///
/// `random` is expected in `[0, 1)`.
fn randomize(interval: Duration, factor: f64, random: f64) -> Duration {
    let interval = interval.as_nanos() as f64;
    let delta = factor * interval;
    let min = interval - delta;
    let max = interval + delta;
    Duration::from_nanos((min + random * (max - min)).round().max(0.0) as u64)
}
