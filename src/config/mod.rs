//! Configuration module for wfind
//!
//! This module holds the raw [`FindOptions`] a user supplies, their
//! validation and normalization into an immutable [`Policy`], and loading of
//! options from TOML files.
//!
//! # Example
//!
//! ```no_run
//! use wfind::config::load_config;
//! use std::path::Path;
//!
//! let policy = load_config(Path::new("wfind.toml")).unwrap();
//! println!("Crawling {} seeds", policy.seeds().len());
//! ```

mod parser;
mod policy;
mod types;
mod validation;

pub use parser::{load_config, load_options};
pub use policy::{Policy, PolicyBuilder};
pub use types::{
    BackoffOptions, ConcurrencyMode, EntryType, FindOptions, RetryConfig, TransportConfig,
    DEFAULT_MAX_BODY_SIZE, DEFAULT_NAME_PATTERN,
};
pub use validation::sanitize_pattern;
