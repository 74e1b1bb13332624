//! wfind main entry point
//!
//! This is the command-line interface for finding files and directories in
//! web server directory listings.

use anyhow::Context;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use wfind::config::{load_options, BackoffOptions, ConcurrencyMode, RetryConfig};
use wfind::output::{write_result, OutputFormat};
use wfind::FindOptions;
use tracing_subscriber::EnvFilter;

/// wfind: find folders and files in web sites using HTTP or HTTPS
///
/// Walks the directory listings served under each URL and prints every entry
/// whose base name matches the pattern, like GNU find does on a file system.
#[derive(Parser, Debug)]
#[command(name = "wfind")]
#[command(version)]
#[command(about = "Find folders and files in web sites using HTTP or HTTPS", long_about = None)]
struct Cli {
    /// Seed URLs to start from
    #[arg(value_name = "URL", required_unless_present = "config")]
    urls: Vec<String>,

    /// Base name pattern (the path with the leading directories removed)
    #[arg(short, long, value_name = "REGEX")]
    name: Option<String>,

    /// Type of entry to find: f (file) or d (directory)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    entry_type: Option<String>,

    /// Whether to recurse into directories; false behaves like GNU find -maxdepth 0
    #[arg(short, long, value_name = "BOOL", action = clap::ArgAction::Set)]
    recursive: Option<bool>,

    /// Whether to visit pages with concurrent jobs
    #[arg(long = "async", value_name = "BOOL", action = clap::ArgAction::Set)]
    concurrent: Option<bool>,

    /// Maximum number of bytes read from each response body
    #[arg(long, value_name = "BYTES")]
    max_body_size: Option<usize>,

    /// Maximum time in milliseconds a dial waits for a connect to complete
    #[arg(long, value_name = "MS")]
    connection_timeout: Option<u64>,

    /// Interval in milliseconds between keep-alive probes
    #[arg(long, value_name = "MS")]
    keep_alive_interval: Option<u64>,

    /// Maximum time in milliseconds to wait for a TLS handshake
    #[arg(long, value_name = "MS")]
    tls_handshake_timeout: Option<u64>,

    /// Maximum time in milliseconds a connection stays idle before closing
    #[arg(long, value_name = "MS")]
    idle_connection_timeout: Option<u64>,

    /// Maximum number of idle connections across all hosts
    #[arg(long, value_name = "COUNT")]
    connection_pool_size: Option<usize>,

    /// Maximum number of idle connections for each host
    #[arg(long, value_name = "COUNT")]
    connection_pool_size_per_host: Option<usize>,

    /// Stop after this many milliseconds and print what was found so far
    #[arg(long, value_name = "MS")]
    crawl_timeout: Option<u64>,

    /// Do not retry timed out or reset connections
    #[arg(long)]
    no_retry: bool,

    /// Print each match as base name and URL separated by a tab
    #[arg(short, long)]
    long: bool,

    /// Path to a TOML file with find options
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let options = build_options(&cli)?;
    tracing::debug!("Find options: {:?}", options);

    let found = wfind::find(options).await.context("error finding the file")?;

    let format = if cli.long {
        OutputFormat::Long
    } else {
        OutputFormat::Urls
    };
    write_result(&found, format, &mut io::stdout().lock())?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only the results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wfind=warn,error"),
            1 => EnvFilter::new("wfind=info,warn"),
            2 => EnvFilter::new("wfind=debug,info"),
            _ => EnvFilter::new("wfind=trace,debug"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Merges the config file, if any, with the command-line flags
///
/// Flags win over the file. Without a file every transient failure kind is
/// retried with the default backoff.
fn build_options(cli: &Cli) -> anyhow::Result<FindOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            tracing::info!("Loading options from: {}", path.display());
            load_options(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => FindOptions {
            retry: RetryConfig::all(BackoffOptions::default()),
            ..FindOptions::default()
        },
    };

    options.seeds.extend(cli.urls.iter().cloned());

    if let Some(name) = &cli.name {
        options.name_pattern = name.clone();
    }
    if let Some(entry_type) = &cli.entry_type {
        options.entry_type = Some(entry_type.clone());
    }
    if let Some(recursive) = cli.recursive {
        options.recursive = recursive;
    }
    if let Some(concurrent) = cli.concurrent {
        options.concurrency = if concurrent {
            ConcurrencyMode::Concurrent
        } else {
            ConcurrencyMode::Sequential
        };
    }
    if let Some(max_body_size) = cli.max_body_size {
        options.max_body_size = max_body_size;
    }
    if let Some(crawl_timeout) = cli.crawl_timeout {
        options.crawl_timeout_ms = Some(crawl_timeout);
    }
    if cli.no_retry {
        options.retry = RetryConfig::default();
    }

    let transport = &mut options.transport;
    if let Some(ms) = cli.connection_timeout {
        transport.connection_timeout_ms = ms;
    }
    if let Some(ms) = cli.keep_alive_interval {
        transport.keep_alive_interval_ms = ms;
    }
    if let Some(ms) = cli.tls_handshake_timeout {
        transport.tls_handshake_timeout_ms = ms;
    }
    if let Some(ms) = cli.idle_connection_timeout {
        transport.idle_connection_timeout_ms = ms;
    }
    if let Some(size) = cli.connection_pool_size {
        transport.connection_pool_size = size;
    }
    if let Some(size) = cli.connection_pool_size_per_host {
        transport.connection_pool_size_per_host = size;
    }

    if let Some(ms) = options.crawl_timeout_ms {
        tracing::info!("Crawl limited to {:?}", Duration::from_millis(ms));
    }

    Ok(options)
}
