//! # HTTP Fetching
//!
//! This module is the fetch collaborator behind the `url` provider: it issues a single
//! `GET` for a remote document and hands back the body bytes. Decoding the body is the
//! caller's job.
//!
//! Client settings come from [`HttpFetchConfig`], which can be read from the environment:
//!
//! - `INDIRECT_HTTP_CONNECT_TIMEOUT_SECS`: connect timeout in seconds (`0` disables it)
//! - `INDIRECT_HTTP_TIMEOUT_SECS`: overall request timeout in seconds (`0` disables it)
//! - `INDIRECT_HTTP_USER_AGENT`: `User-Agent` header sent with every request
//! - `INDIRECT_HTTP_SYSTEM_PROXY`: `false` or `0` ignores the system proxy settings

use std::{env, time::Duration};

use reqwest::{Client, Url, header};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const CONNECT_TIMEOUT_ENV: &str = "INDIRECT_HTTP_CONNECT_TIMEOUT_SECS";
pub const TIMEOUT_ENV: &str = "INDIRECT_HTTP_TIMEOUT_SECS";
pub const USER_AGENT_ENV: &str = "INDIRECT_HTTP_USER_AGENT";
pub const SYSTEM_PROXY_ENV: &str = "INDIRECT_HTTP_SYSTEM_PROXY";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_JSON: &str = "application/json";

/// Errors raised while fetching a remote document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("http runtime unavailable: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Settings used to build the HTTP client for remote fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetchConfig {
    /// Maximum time to establish a connection. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Maximum time for the whole request. `None` lets the fetch run to completion or failure.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Route requests through the proxies named by the usual `*_PROXY` variables.
    pub system_proxy: bool,
}

impl Default for HttpFetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            timeout: None,
            user_agent: format!("indirect/{}", env!("CARGO_PKG_VERSION")),
            system_proxy: true,
        }
    }
}

impl HttpFetchConfig {
    /// Build a configuration from defaults overridden by `INDIRECT_HTTP_*` variables.
    ///
    /// Values that cannot be parsed are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(connect_timeout) = duration_from_env(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = connect_timeout;
        }
        if let Some(timeout) = duration_from_env(TIMEOUT_ENV) {
            config.timeout = timeout;
        }
        if let Ok(user_agent) = env::var(USER_AGENT_ENV)
            && !user_agent.trim().is_empty()
        {
            config.user_agent = user_agent.trim().to_string();
        }
        if let Ok(system_proxy) = env::var(SYSTEM_PROXY_ENV) {
            config.system_proxy = !matches!(system_proxy.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        config
    }

    /// Replace the overall request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Construct a `reqwest::Client` that honors this configuration.
    pub fn build_client(&self) -> Result<Client, FetchError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_JSON));

        let mut builder = Client::builder()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .user_agent(self.user_agent.as_str())
            .default_headers(default_headers);
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if !self.system_proxy {
            builder = builder.no_proxy();
        }
        builder.build().map_err(FetchError::Client)
    }
}

/// Body and metadata of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fetches `url` with `GET` and returns the full response body.
///
/// Only `http` and `https` URLs are accepted. Any non-success status is reported as
/// [`FetchError::Status`]; the body of such a response is discarded.
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<FetchedBody, FetchError> {
    let parsed = parse_url(url)?;
    debug!(url = %parsed, "remote fetch started");

    let response = client.get(parsed).send().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "remote fetch returned an error status");
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;

    info!(url = %url, status = status.as_u16(), byte_count = bytes.len(), "remote fetch completed");
    Ok(FetchedBody {
        status: status.as_u16(),
        content_type,
        bytes: bytes.to_vec(),
    })
}

pub(crate) fn parse_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|error| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: error.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// `None` when unset or invalid, `Some(None)` for an explicit `0`.
fn duration_from_env(key: &str) -> Option<Option<Duration>> {
    let raw = env::var(key).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(0) => Some(None),
        Ok(seconds) => Some(Some(Duration::from_secs(seconds))),
        Err(error) => {
            warn!(variable = key, value = raw, error = %error, "ignoring invalid timeout override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_static_fetch_settings() {
        let config = HttpFetchConfig::default();
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.timeout, None);
        assert!(config.user_agent.starts_with("indirect/"));
        assert!(config.system_proxy);
    }

    #[test]
    fn env_overrides_timeouts_and_user_agent() {
        temp_env::with_vars(
            [
                (CONNECT_TIMEOUT_ENV, Some("5")),
                (TIMEOUT_ENV, Some("12")),
                (USER_AGENT_ENV, Some("custom-agent/1.0")),
                (SYSTEM_PROXY_ENV, Some("off")),
            ],
            || {
                let config = HttpFetchConfig::from_env();
                assert!(!config.system_proxy);
                assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
                assert_eq!(config.timeout, Some(Duration::from_secs(12)));
                assert_eq!(config.user_agent, "custom-agent/1.0");
            },
        );
    }

    #[test]
    fn zero_disables_and_garbage_is_ignored() {
        temp_env::with_vars([(CONNECT_TIMEOUT_ENV, Some("0")), (TIMEOUT_ENV, Some("soon"))], || {
            let config = HttpFetchConfig::from_env();
            assert_eq!(config.connect_timeout, None);
            assert_eq!(config.timeout, None);
        });
    }

    #[test]
    fn with_timeout_replaces_the_overall_timeout() {
        let config = HttpFetchConfig::default().with_timeout(Some(Duration::from_secs(3)));
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn parse_url_accepts_http_and_https_only() {
        assert!(parse_url("http://localhost:8888/").is_ok());
        assert!(parse_url("https://example.com/config.json").is_ok());

        let error = parse_url("ftp://example.com/config.json").unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl { .. }));
        assert!(error.to_string().contains("unsupported scheme 'ftp'"));

        let error = parse_url("not a url").unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl { .. }));
    }
}
