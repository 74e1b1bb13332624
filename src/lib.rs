//! wfind: find files and directories in web server directory listings
//!
//! This crate crawls the auto-generated index pages that static file servers
//! emit, starting from one or more seed URLs, and returns every entry whose
//! base name matches a pattern, optionally descending into subdirectories.

pub mod backoff;
pub mod config;
pub mod crawler;
pub mod observer;
pub mod output;
pub mod state;
pub mod url;

use std::sync::Arc;
use thiserror::Error;

/// Main error type for wfind operations
#[derive(Debug, Error)]
pub enum WfindError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to crawl seed {url}: {source}")]
    Crawl {
        url: String,
        #[source]
        source: crawler::FetchError,
    },

    #[error("Visit of seed {url} did not complete: {source}")]
    TaskFailed {
        url: String,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid visit transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: state::VisitOutcome,
        to: state::VisitOutcome,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for wfind operations
pub type Result<T> = std::result::Result<T, WfindError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{EntryType, FindOptions, Policy, PolicyBuilder};
pub use observer::{CrawlObserver, TracingObserver};
pub use output::FindResult;

/// Runs a complete find job over HTTP(S)
///
/// Validates the options, builds an HTTP fetcher from the transport settings
/// restricted to the seeds' hosts, and crawls every seed.
///
/// # Example
///
/// ```no_run
/// use wfind::{find, FindOptions};
///
/// # async fn example() -> wfind::Result<()> {
/// let options = FindOptions {
///     seeds: vec!["https://mirrors.example.org/centos/".to_string()],
///     name_pattern: "repomd.xml$".to_string(),
///     ..FindOptions::default()
/// };
/// let found = find(options).await?;
/// for url in &found.urls {
///     println!("{}", url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn find(options: FindOptions) -> Result<FindResult> {
    let policy = options.validate()?;
    let fetcher = crawler::HttpFetcher::new(&policy)?;
    crawler::run_find(
        Arc::new(policy),
        Arc::new(fetcher),
        Arc::new(TracingObserver),
    )
    .await
}
