//! Fetching public Threads profile pages.
//!
//! The request mimics a desktop browser navigation; without those headers the
//! site tends to serve a stripped page with no embedded post data. Header
//! values come from an explicit [`FetchConfig`], there is no shared session.
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use spool_config::FetchSettings;
use spool_http::{HttpClient, HttpError, RequestOpts};
use std::collections::BTreeMap;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Everything needed to build a [`ThreadsClient`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retries: usize,
    pub user_agent: String,
    pub accept_language: String,
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchSettings::default().into()
    }
}

impl From<FetchSettings> for FetchConfig {
    fn from(s: FetchSettings) -> Self {
        Self {
            base_url: s.base_url,
            timeout: Duration::from_secs(s.timeout_secs),
            retries: s.retries,
            user_agent: s.user_agent,
            accept_language: s.accept_language,
            extra_headers: s.headers,
        }
    }
}

impl FetchConfig {
    /// Browser-like navigation headers followed by `extra_headers`.
    pub fn headers(&self) -> Result<HeaderMap, HttpError> {
        let mut h = HeaderMap::new();
        h.insert(USER_AGENT, header_value(&self.user_agent)?);
        h.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        h.insert(ACCEPT_LANGUAGE, header_value(&self.accept_language)?);
        h.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        h.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        h.insert("sec-fetch-site", HeaderValue::from_static("none"));
        h.insert("sec-fetch-user", HeaderValue::from_static("?1"));
        h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        for (name, value) in &self.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::Build(format!("invalid header name `{name}`: {e}")))?;
            h.insert(name, header_value(value)?);
        }
        Ok(h)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(raw).map_err(|e| HttpError::Build(format!("invalid header value: {e}")))
}

/// Why a profile page could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid username `{0}`")]
    InvalidUsername(String),
    #[error("user not found")]
    NotFound,
    #[error("request failed (status code: {})", .0.as_u16())]
    Status(StatusCode),
    #[error("network request error: {0}")]
    Transport(String),
    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<HttpError> for FetchError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Api { status, .. } if status == StatusCode::NOT_FOUND => FetchError::NotFound,
            HttpError::Api { status, .. } => FetchError::Status(status),
            HttpError::Network(msg) => FetchError::Transport(msg),
            HttpError::Url(msg) | HttpError::Build(msg) => FetchError::Setup(msg),
        }
    }
}

/// Source of raw profile pages. Anything other than a 200 is a failure.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch_profile(&self, username: &str) -> Result<String, FetchError>;
}

/// Strip one leading `@` and surrounding whitespace; reject names that would
/// escape the profile path.
pub fn clean_username(raw: &str) -> Result<&str, FetchError> {
    let name = raw.trim();
    let name = name.strip_prefix('@').unwrap_or(name);
    let bad = |c: char| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '\\');
    if name.is_empty() || name.chars().any(bad) {
        return Err(FetchError::InvalidUsername(raw.to_string()));
    }
    Ok(name)
}

#[derive(Clone)]
pub struct ThreadsClient {
    http: HttpClient,
}

impl ThreadsClient {
    pub fn new(config: &FetchConfig) -> Result<Self, HttpError> {
        let http = HttpClient::new(&config.base_url)?
            .with_timeout(config.timeout)
            .with_retries(config.retries)
            .with_default_headers(config.headers()?);
        Ok(Self { http })
    }
}

#[async_trait]
impl ProfileFetcher for ThreadsClient {
    async fn fetch_profile(&self, username: &str) -> Result<String, FetchError> {
        let name = clean_username(username)?;
        let path = format!("@{name}");
        tracing::info!(base = %self.http.base(), %path, "fetching profile");

        let page = self.http.get_text(&path, RequestOpts::default()).await?;
        if page.status != StatusCode::OK {
            tracing::warn!(%path, status = %page.status, "unexpected profile status");
            return Err(FetchError::Status(page.status));
        }
        tracing::debug!(%path, page_len = page.body.len(), "profile fetched");
        Ok(page.body)
    }
}
