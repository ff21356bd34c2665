//! Shared HTTP client with User-Agent rotation.
//!
//! Provides a configured [`reqwest::Client`] with browser-like headers,
//! cookie support, and rotating User-Agent strings. One client is built per
//! research session and shared by every retriever and scraper strategy.

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings, one picked per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] for search backends and page fetches.
///
/// The client has:
/// - Cookie store enabled (consent pages, session-bound result pages)
/// - Timeout from config
/// - Random User-Agent from built-in rotation list (or custom if configured)
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`RetrievalError::Http`] if the client cannot be constructed.
pub fn build_client(config: &RetrievalConfig) -> Result<reqwest::Client, RetrievalError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| RetrievalError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const array; choose only returns None on empty slices.
        .unwrap_or(USER_AGENTS[0])
}

/// Send a prepared request and return the body of a successful response.
///
/// Non-2xx statuses become [`RetrievalError::Http`] carrying the status and
/// the `source` label; the request URL is never included.
pub(crate) async fn fetch_text(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<String, RetrievalError> {
    let response = send_checked(request, source).await?;
    response
        .text()
        .await
        .map_err(|e| RetrievalError::Http(format!("{source} response read failed: {}", e.without_url())))
}

async fn send_checked(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<reqwest::Response, RetrievalError> {
    let response = request
        .send()
        .await
        .map_err(|e| RetrievalError::Http(format!("{source} request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RetrievalError::Http(format!("{source} returned HTTP {status}")));
    }
    Ok(response)
}

/// Like [`fetch_text`], returning the raw body bytes.
pub(crate) async fn fetch_bytes(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<Vec<u8>, RetrievalError> {
    let response = send_checked(request, source).await?;
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| RetrievalError::Http(format!("{source} response read failed: {}", e.without_url())))
}

/// Like [`fetch_text`], decoding the body as JSON.
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    source: &str,
) -> Result<T, RetrievalError> {
    let body = fetch_text(request, source).await?;
    serde_json::from_str(&body)
        .map_err(|e| RetrievalError::Parse(format!("{source} returned invalid JSON: {e}")))
}
