use crate::backoff::{BackoffSpec, Clock, FailureKind};
use crate::config::types::{
    BackoffOptions, ConcurrencyMode, EntryType, FindOptions, RetryConfig, TransportConfig,
};
use crate::config::validation::validate;
use crate::url::allowed_hosts;
use crate::ConfigError;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Validated, immutable configuration of one find job
///
/// Built once from [`FindOptions`] before any network activity and shared
/// read-only by every visit of the crawl.
#[derive(Debug, Clone)]
pub struct Policy {
    options: FindOptions,
    seeds: Vec<Url>,
    allowed_hosts: Vec<String>,
    name_pattern: Regex,
    entry_type: EntryType,
    on_context_deadline: Option<BackoffSpec>,
    on_connection_timeout: Option<BackoffSpec>,
    on_connection_reset: Option<BackoffSpec>,
}

impl FindOptions {
    /// Validates and normalizes the options into a [`Policy`]
    ///
    /// # Returns
    ///
    /// * `Ok(Policy)` - The options are valid
    /// * `Err(ConfigError)` - No seeds, an invalid seed URL, an empty or
    ///   invalid name pattern, an unknown entry type or an invalid backoff
    pub fn validate(mut self) -> Result<Policy, ConfigError> {
        validate(&mut self)?;
        Policy::from_normalized(self)
    }
}

impl Policy {
    fn from_normalized(options: FindOptions) -> Result<Self, ConfigError> {
        let seeds = options
            .seeds
            .iter()
            .map(|seed| {
                Url::parse(seed)
                    .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name_pattern = Regex::new(&options.name_pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("error compiling the file name expression: {}", e))
        })?;

        let entry_type = options
            .entry_type
            .as_deref()
            .unwrap_or(EntryType::File.as_str())
            .parse()?;

        let spec = |o: &Option<BackoffOptions>| o.as_ref().map(BackoffSpec::from_options);

        Ok(Self {
            allowed_hosts: allowed_hosts(&seeds),
            on_context_deadline: spec(&options.retry.context_deadline),
            on_connection_timeout: spec(&options.retry.connection_timeout),
            on_connection_reset: spec(&options.retry.connection_reset),
            seeds,
            name_pattern,
            entry_type,
            options,
        })
    }

    /// The normalized options this policy was built from
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Seed URLs, each ending with a path separator
    pub fn seeds(&self) -> &[Url] {
        &self.seeds
    }

    /// Returns true if the URL is one of the configured seeds
    pub fn is_seed(&self, url: &Url) -> bool {
        self.seeds.iter().any(|seed| seed == url)
    }

    /// Hostnames visits are restricted to
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    /// The sanitized name pattern
    pub fn name_pattern(&self) -> &Regex {
        &self.name_pattern
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_recursive(&self) -> bool {
        self.options.recursive
    }

    pub fn concurrency(&self) -> ConcurrencyMode {
        self.options.concurrency
    }

    pub fn max_body_size(&self) -> usize {
        self.options.max_body_size
    }

    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.options.crawl_timeout_ms.map(Duration::from_millis)
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.options.transport
    }

    /// Backoff policy for a failure kind, if one is configured
    ///
    /// [`FailureKind::Other`] never has one.
    pub fn backoff_for(&self, kind: FailureKind) -> Option<&BackoffSpec> {
        match kind {
            FailureKind::ContextDeadlineExceeded => self.on_context_deadline.as_ref(),
            FailureKind::ConnectionTimedOut => self.on_connection_timeout.as_ref(),
            FailureKind::ConnectionReset => self.on_connection_reset.as_ref(),
            FailureKind::Other => None,
        }
    }

    /// Returns a copy whose backoff policies read time from `clock`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        for spec in [
            &mut self.on_context_deadline,
            &mut self.on_connection_timeout,
            &mut self.on_connection_reset,
        ]
        .into_iter()
        .flatten()
        {
            spec.clock = clock.clone();
        }
        self
    }
}

/// Fluent builder over [`FindOptions`]
///
/// # Example
///
/// ```
/// use wfind::config::{ConcurrencyMode, EntryType, PolicyBuilder};
///
/// let policy = PolicyBuilder::new()
///     .seed("https://mirrors.example.org/pub")
///     .name_pattern("^docs$")
///     .entry_type(EntryType::Directory)
///     .recursive(false)
///     .concurrency(ConcurrencyMode::Sequential)
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.seeds()[0].as_str(), "https://mirrors.example.org/pub/");
/// assert!(policy.name_pattern().is_match("./docs/"));
/// ```
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    options: FindOptions,
    clock: Option<Arc<dyn Clock>>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing options, e.g. loaded from a config file
    pub fn from_options(options: FindOptions) -> Self {
        Self {
            options,
            clock: None,
        }
    }

    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.options.seeds.push(seed.into());
        self
    }

    pub fn seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.seeds.extend(seeds.into_iter().map(Into::into));
        self
    }

    pub fn name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.options.name_pattern = pattern.into();
        self
    }

    pub fn entry_type(mut self, entry_type: EntryType) -> Self {
        self.options.entry_type = Some(entry_type.as_str().to_string());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.options.recursive = recursive;
        self
    }

    pub fn concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.options.concurrency = mode;
        self
    }

    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.options.max_body_size = bytes;
        self
    }

    pub fn crawl_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.options.crawl_timeout_ms = Some(millis);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.options.retry = retry;
        self
    }

    pub fn on_context_deadline(mut self, backoff: BackoffOptions) -> Self {
        self.options.retry.context_deadline = Some(backoff);
        self
    }

    pub fn on_connection_timeout(mut self, backoff: BackoffOptions) -> Self {
        self.options.retry.connection_timeout = Some(backoff);
        self
    }

    pub fn on_connection_reset(mut self, backoff: BackoffOptions) -> Self {
        self.options.retry.connection_reset = Some(backoff);
        self
    }

    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.options.transport = transport;
        self
    }

    /// Clock used by every backoff policy, for deterministic tests
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Policy, ConfigError> {
        let policy = self.options.validate()?;
        Ok(match self.clock {
            Some(clock) => policy.with_clock(clock),
            None => policy,
        })
    }
}
