//! HTTP fetcher implementation
//!
//! This module handles every request the crawler makes:
//! - Building the HTTP client from the transport settings
//! - Refusing hosts outside the seeds' domains, including on redirects
//! - Reading bodies up to the configured size limit
//! - Mapping failures to errors the backoff supervisor can classify

use crate::backoff::{classify, FailureKind};
use crate::config::{Policy, TransportConfig};
use crate::url::is_allowed_host;
use async_trait::async_trait;
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// Errors that end a single visit
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{url}: host is not in the allowed domains")]
    HostNotAllowed { url: String },

    #[error("server responded {status} for {url}")]
    Status { url: String, status: StatusCode },
}

impl FetchError {
    /// Kind of failure for retry purposes
    pub fn failure_kind(&self) -> FailureKind {
        classify(self)
    }

    /// Returns true if the visit was refused before any request was made
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::HostNotAllowed { .. })
    }
}

/// A fetched listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects; relative hrefs resolve against it
    pub url: Url,

    pub body: String,

    /// True if the body was cut at the size limit
    pub truncated: bool,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
            truncated: false,
        }
    }
}

/// Source of listing pages
///
/// The crawler only depends on this trait, so the HTTP stack can be swapped
/// for an in-memory one.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// Builds an HTTP client from the transport settings
///
/// reqwest's connect timeout covers both the TCP connect and the TLS
/// handshake, so it is set to the sum of the two timeouts. Only idle
/// connections per host can be capped; the tighter of the two pool limits is
/// used.
///
/// # Arguments
///
/// * `transport` - The transport configuration
/// * `allowed_hosts` - Hosts that redirects may lead to
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    transport: &TransportConfig,
    allowed_hosts: &[String],
) -> Result<Client, reqwest::Error> {
    let allowed = allowed_hosts.to_vec();
    let redirect_policy = redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_allowed_host(attempt.url(), &allowed) {
            attempt.follow()
        } else {
            attempt.stop()
        }
    });

    let mut builder = Client::builder()
        .user_agent(concat!("wfind/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_millis(
            transport
                .connection_timeout_ms
                .saturating_add(transport.tls_handshake_timeout_ms),
        ))
        .tcp_keepalive(Duration::from_millis(transport.keep_alive_interval_ms))
        .pool_idle_timeout(Duration::from_millis(transport.idle_connection_timeout_ms))
        .pool_max_idle_per_host(
            transport
                .connection_pool_size_per_host
                .min(transport.connection_pool_size),
        )
        .redirect(redirect_policy)
        .gzip(true)
        .brotli(true);

    if let Some(timeout_ms) = transport.request_timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }

    builder.build()
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    allowed_hosts: Vec<String>,
    max_body_size: usize,
}

impl HttpFetcher {
    /// Creates a fetcher restricted to the policy's seed hosts
    pub fn new(policy: &Policy) -> Result<Self, reqwest::Error> {
        let client = build_http_client(policy.transport(), policy.allowed_hosts())?;
        Ok(Self::with_client(
            client,
            policy.allowed_hosts().to_vec(),
            policy.max_body_size(),
        ))
    }

    pub fn with_client(client: Client, allowed_hosts: Vec<String>, max_body_size: usize) -> Self {
        Self {
            client,
            allowed_hosts,
            max_body_size,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        if !is_allowed_host(url, &self.allowed_hosts) {
            return Err(FetchError::HostNotAllowed {
                url: url.to_string(),
            });
        }

        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let final_url = response.url().clone();
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await? {
            let remaining = self.max_body_size - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Page {
            url: final_url,
            body: String::from_utf8_lossy(&body).into_owned(),
            truncated,
        })
    }
}
