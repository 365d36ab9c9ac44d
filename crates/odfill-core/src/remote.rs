//! HTTP fetching for remote resources (blocking, no async)

use crate::error::OdfillError;
use reqwest::blocking::Client;
use std::time::Duration;

/// Default timeout for remote fetches
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent for odfill requests
pub const USER_AGENT: &str = "odfill";

/// Builds an HTTP client with the given timeout
///
/// # Errors
///
/// Returns error if client construction fails
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).timeout(timeout).build()
}

/// Fetch a remote resource into memory
///
/// A bounded timeout prevents one unreachable resource from stalling the
/// whole run.
///
/// # Errors
///
/// Returns `NetworkFetch` on connection errors, non-success status codes
/// or body read failures.
pub fn fetch_bytes(url: &str, timeout: Duration) -> Result<Vec<u8>, OdfillError> {
    let network = |reason: String| OdfillError::NetworkFetch {
        url: url.to_string(),
        reason,
    };

    let parsed = url::Url::parse(url).map_err(|e| network(e.to_string()))?;
    let client = build_client(timeout).map_err(|e| network(e.to_string()))?;

    let response = client
        .get(parsed)
        .send()
        .map_err(|e| network(e.to_string()))?;

    if let Err(err) = response.error_for_status_ref() {
        return Err(network(err.without_url().to_string()));
    }

    let bytes = response.bytes().map_err(|e| network(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Last path segment of a URL, used when deriving stored file names
pub fn url_file_name(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}
