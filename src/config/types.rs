use crate::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default limit in bytes of each retrieved response body (512 KiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 512 * 1024;

/// Default name pattern: any non-empty base name
pub const DEFAULT_NAME_PATTERN: &str = ".+";

/// Raw options for one find job
///
/// This is what a user supplies, either through the command line or a TOML
/// file. Nothing here has been checked yet; [`FindOptions::validate`] turns it
/// into an immutable [`Policy`](crate::config::Policy).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FindOptions {
    /// URLs of the directory listings the crawl starts from
    pub seeds: Vec<String>,

    /// Regular expression the base name of an entry must match
    #[serde(rename = "name")]
    pub name_pattern: String,

    /// Entry type to look for: `f` (files, the default) or `d` (directories)
    #[serde(rename = "type")]
    pub entry_type: Option<String>,

    /// Whether to descend into subdirectories
    pub recursive: bool,

    /// How visits are scheduled
    pub concurrency: ConcurrencyMode,

    /// Maximum number of bytes read from each response body (0 means default)
    pub max_body_size: usize,

    /// Deadline for the whole crawl in milliseconds
    pub crawl_timeout_ms: Option<u64>,

    /// Backoff policies for transient network failures
    pub retry: RetryConfig,

    /// HTTP transport settings
    pub transport: TransportConfig,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
            entry_type: None,
            recursive: true,
            concurrency: ConcurrencyMode::default(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            crawl_timeout_ms: None,
            retry: RetryConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Kind of directory entry a find job looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryType {
    /// Regular files (anchors without a trailing slash)
    #[default]
    File,
    /// Directories (anchors with a trailing slash)
    Directory,
}

impl EntryType {
    /// Short form used in options and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "f",
            Self::Directory => "d",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" | "file" => Ok(Self::File),
            "d" | "dir" | "directory" => Ok(Self::Directory),
            other => Err(ConfigError::Validation(format!(
                "file type not supported: '{}' (expected 'f' or 'd')",
                other
            ))),
        }
    }
}

/// Scheduling of visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// One visit in flight at a time, deterministic result order
    Sequential,
    /// Every visit runs as its own task
    #[default]
    Concurrent,
}

/// Per-failure-kind backoff policies
///
/// A kind left unset is never retried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Retry when the request deadline is exceeded
    pub context_deadline: Option<BackoffOptions>,

    /// Retry when establishing the connection times out
    pub connection_timeout: Option<BackoffOptions>,

    /// Retry when the peer resets the connection
    pub connection_reset: Option<BackoffOptions>,
}

impl RetryConfig {
    /// Uses the same backoff options for every transient failure kind
    pub fn all(options: BackoffOptions) -> Self {
        Self {
            context_deadline: Some(options.clone()),
            connection_timeout: Some(options.clone()),
            connection_reset: Some(options),
        }
    }
}

/// Exponential backoff parameters, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BackoffOptions {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Zero means retry forever
    pub max_elapsed_time_ms: u64,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            initial_interval_ms: 2_000,
            max_interval_ms: 10_000,
            max_elapsed_time_ms: 5 * 60 * 1_000,
        }
    }
}

impl BackoffOptions {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn max_elapsed_time(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_time_ms)
    }
}

/// HTTP transport configuration
///
/// These values are handed to the HTTP client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransportConfig {
    /// Maximum time a dial waits for a connect to complete (milliseconds)
    pub connection_timeout_ms: u64,

    /// Interval between keep-alive probes (milliseconds)
    pub keep_alive_interval_ms: u64,

    /// Maximum time to wait for a TLS handshake (milliseconds)
    pub tls_handshake_timeout_ms: u64,

    /// Maximum time an idle connection stays open (milliseconds)
    pub idle_connection_timeout_ms: u64,

    /// Maximum idle connections across all hosts
    pub connection_pool_size: usize,

    /// Maximum idle connections for each host
    pub connection_pool_size_per_host: usize,

    /// Overall timeout of a single request, headers and body (milliseconds)
    pub request_timeout_ms: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: 180_000,
            keep_alive_interval_ms: 30_000,
            tls_handshake_timeout_ms: 30_000,
            idle_connection_timeout_ms: 120_000,
            connection_pool_size: 1_000,
            connection_pool_size_per_host: 1_000,
            request_timeout_ms: None,
        }
    }
}
