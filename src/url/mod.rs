//! URL handling module for wfind
//!
//! This module provides seed normalization, hyperlink resolution against the
//! page it was found on, base name extraction and the hostname allow-list
//! derived from the seeds.

mod domain;
mod normalize;

pub use domain::{allowed_hosts, extract_domain, is_allowed_host};
pub use normalize::{
    base_name, ensure_trailing_slash, href_base_name, is_followable_href, resolve_href,
};
