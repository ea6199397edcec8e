//! Shared HTTP plumbing for the platform adapters
//!
//! Each adapter builds exactly one [`reqwest::Client`] through
//! [`build_client`] and reuses it for every call. Non-2xx responses go
//! through [`map_status`], the single place where HTTP statuses become
//! [`ApiError`] kinds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ApiError, Error, Result};

/// Fixed ceiling applied to every outbound request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream bodies quoted in error messages are cut to this many chars
pub const BODY_SNIPPET_LEN: usize = 500;

/// Build the long-lived, pooled client for one platform
pub fn build_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(user_agent)
        .build()
        .map_err(Error::Http)
}

/// Pass a 2xx response through; map anything else to an [`ApiError`]
pub async fn check_status(response: Response) -> std::result::Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    let err = map_status(status, &headers, &body);
    warn!(status = status.as_u16(), kind = err.kind().as_str(), "Upstream request failed");
    Err(err)
}

/// Read and decode a successful JSON body
pub async fn decode_json<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, ApiError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        ApiError::upstream(
            Some(status),
            format!("failed to decode response: {} ({})", e, snippet(&body)),
        )
    })
}

/// `check_status` followed by `decode_json`
pub async fn read_json<T: DeserializeOwned>(
    response: Response,
) -> std::result::Result<T, ApiError> {
    let response = check_status(response).await?;
    decode_json(response).await
}

/// Map a non-success status to exactly one error kind
pub fn map_status(status: StatusCode, headers: &HeaderMap, body: &str) -> ApiError {
    let code = status.as_u16();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        format!("{}: {}", code, snippet(body))
    };

    match code {
        401 => ApiError::Authentication {
            status: Some(code),
            message,
        },
        // GitHub signals both primary and secondary rate limits with 403
        403 if is_rate_limit(headers) => ApiError::RateLimited {
            status: Some(code),
            message,
            retry_after: retry_after(headers),
        },
        403 => ApiError::Authentication {
            status: Some(code),
            message,
        },
        404 | 410 => ApiError::NotFound {
            status: Some(code),
            message,
        },
        400 | 422 => ApiError::Validation {
            status: Some(code),
            message,
        },
        429 => ApiError::RateLimited {
            status: Some(code),
            message,
            retry_after: retry_after(headers),
        },
        _ => ApiError::Upstream {
            status: Some(code),
            message,
        },
    }
}

fn is_rate_limit(headers: &HeaderMap) -> bool {
    headers.contains_key(RETRY_AFTER)
        || header_str(headers, "x-ratelimit-remaining") == Some("0")
}

/// Retry hint in seconds
///
/// `Retry-After` (delta-seconds form) wins; otherwise the GitHub style
/// `x-ratelimit-reset` epoch is turned into a delta.
pub fn retry_after(headers: &HeaderMap) -> Option<u64> {
    if let Some(value) = header_str(headers, RETRY_AFTER.as_str()) {
        return value.trim().parse().ok();
    }

    let reset: u64 = header_str(headers, "x-ratelimit-reset")?.trim().parse().ok()?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(reset.saturating_sub(now))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First [`BODY_SNIPPET_LEN`] characters of an upstream body
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
