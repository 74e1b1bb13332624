//! Crawler module for walking directory listings
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`Fetcher`] trait
//! - Anchor extraction from listing pages
//! - Link classification against the find policy
//! - Overall traversal coordination

mod classifier;
mod coordinator;
mod fetcher;
mod parser;

pub use classifier::{classify_link, is_backward_link, is_directory_href, Classification};
pub use coordinator::{run_find, Coordinator};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher, Page};
pub use parser::{extract_anchors, Anchor};
