//! Small HTTP client for fetching pages with retries and safe logging.
//!
//! - Per-request options: timeout, retries
//! - Client-wide default headers (e.g. a browser-like header set)
//! - Retries 429/5xx and send failures with exponential backoff and `Retry-After`
//! - Cookie and authorization values never reach the logs
//! - Optional *raw* request/response logging via `SPOOL_HTTP_RAW=1`
//!
//! ```no_run
//! # async fn demo() -> Result<(), spool_http::HttpError> {
//! let client = spool_http::HttpClient::new("https://www.example.com")?;
//! let page = client
//!     .get_text("@someone", spool_http::RequestOpts::default())
//!     .await?;
//! println!("{} ({} bytes)", page.status, page.body.len());
//! # Ok(()) }
//! ```
//!
//! Events: `http.request.start`, `http.response.headers`,
//! `http.response.body_snippet`, `http.retrying*`, `http.error`, and raw
//! request/response lines on target `http.raw` when enabled.

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "SPOOL_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_sensitive_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization") || name.eq_ignore_ascii_case("cookie")
}

/// Render a curl command for reproducing a request, with sensitive headers redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, value) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, value.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_sensitive_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Status code for errors that came back from the server.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Per-request overrides of the client defaults.
///
/// ```
/// use spool_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert_eq!(opts.retries, None);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
}

/// A successful (2xx) response. The exact status is kept so callers can
/// insist on a specific one.
#[derive(Clone, Debug)]
pub struct TextResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    default_headers: HeaderMap,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```no_run
    /// use spool_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://www.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_headers: HeaderMap::new(),
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// Headers sent with every request.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET a page relative to the base URL and return its status and body
    /// decoded as UTF-8 (lossily).
    pub async fn get_text(&self, path: &str, opts: RequestOpts) -> Result<TextResponse, HttpError> {
        let (status, body) = self.request_internal(Method::GET, path, opts).await?;
        Ok(TextResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn request_internal(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts,
    ) -> Result<(StatusCode, Vec<u8>), HttpError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let headers = &self.default_headers;

        let mut attempt = 0usize;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        loop {
            let rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .headers(headers.clone());

            let req_id = format!(
                "r{:x}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            );

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms=timeout.as_millis() as u64,
                header_count=headers.len(),
                "http.request.start"
            );

            if raw_enabled() {
                let curl = make_curl(&method, &url, headers);
                tracing::debug!(target: "http.raw", %req_id, %curl, "request");
            }

            let t0 = std::time::Instant::now();
            let resp = match rb.send().await {
                Ok(resp) => resp,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_send"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, message=%message, "http.network_error.send");
                    return Err(HttpError::Network(message));
                }
            };
            let status = resp.status();
            let resp_headers = resp.headers().clone();
            let bytes = match resp.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network_body"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, message=%message, "http.network_error.body");
                    return Err(HttpError::Network(message));
                }
            };
            let dur_ms = t0.elapsed().as_millis() as u64;

            let x_request_id = resp_headers
                .get("x-request-id")
                .or_else(|| resp_headers.get("x-fb-trace-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=dur_ms,
                body_len=bytes.len(),
                x_request_id=%x_request_id,
                "http.response.headers"
            );

            if raw_enabled() {
                let hdrs = redact_headers(&resp_headers);
                let truncated = bytes.len() > RAW_MAX_BODY;
                let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%status,
                    duration_ms=dur_ms,
                    headers=?hdrs,
                    body=%text,
                    truncated
                );
            }

            let snippet = snip_body(&bytes);
            tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

            if status.is_success() {
                return Ok((status, bytes.to_vec()));
            }

            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;
            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after_delay_secs(&resp_headers) {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    body_snippet=%snippet,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            let message = extract_error_message(&bytes);
            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%x_request_id,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: x_request_id.to_string(),
            });
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

/// Best message for a failed response: a JSON `message`/`error` field, else a body snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_MAX {
        return text.into_owned();
    }
    let mut cut = SNIPPET_MAX;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn snippets_respect_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn cookies_are_redacted() {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_static("sessionid=secret"));
        h.insert("accept", HeaderValue::from_static("text/html"));
        let url = Url::parse("https://www.threads.net/@someone").unwrap();
        let curl = make_curl(&Method::GET, &url, &h);
        assert!(!curl.contains("secret"));
        assert!(curl.contains("cookie: <redacted>"));
        assert!(curl.contains("accept: text/html"));
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(extract_error_message(br#"{"message":"nope"}"#), "nope");
        assert_eq!(extract_error_message(b"<html>gone</html>"), "<html>gone</html>");
    }

    #[test]
    fn backoff_grows_and_saturates() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert!(backoff(100) >= backoff(17));
    }
}
