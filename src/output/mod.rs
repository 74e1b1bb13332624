//! Output module for collecting and printing find results
//!
//! This module handles:
//! - Accumulating matches from concurrent visits
//! - Writing results to stdout or any other writer

mod accumulator;
mod printer;

pub use accumulator::ResultAccumulator;
pub use printer::{write_result, OutputFormat};

use url::Url;

/// Matches of one find job
///
/// `base_names[i]` is the base name of `urls[i]`. Entries are in discovery
/// order, which is only deterministic for sequential crawls, and are not
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindResult {
    pub base_names: Vec<String>,
    pub urls: Vec<Url>,
}

impl FindResult {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Pairs of base name and URL, in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Url)> {
        self.base_names
            .iter()
            .map(String::as_str)
            .zip(self.urls.iter())
    }

    pub(crate) fn push(&mut self, base_name: impl Into<String>, url: Url) {
        self.base_names.push(base_name.into());
        self.urls.push(url);
    }
}
