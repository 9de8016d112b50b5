//! Shared reqwest plumbing for the upstream clients.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::UpstreamError;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "urbanpulse/0.1 (urban-analytics)";

/// Build the shared-settings HTTP client used by every upstream client.
///
/// # Errors
///
/// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, UpstreamError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Normalise a base URL so it ends with exactly one slash, keeping joined
/// paths relative to the root rather than replacing the last segment.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidBaseUrl`] if the URL does not parse.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, UpstreamError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| UpstreamError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}
