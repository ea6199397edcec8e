//! Error types for ops-core
//!
//! `ApiError` はすべてのプラットフォームアダプターが共有するエラー分類です。
//! `Error` は起動時（設定・クライアント構築・ディスパッチ）のエラーです。

use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;

/// Serializable tag of an [`ApiError`], as shown to the calling agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    NotFound,
    RateLimited,
    Validation,
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Validation => "validation",
            Self::Upstream => "upstream",
        }
    }
}

/// Failure of a single adapter call
///
/// Every adapter method that touches the network maps its failure to exactly
/// one of these variants. Transport errors never escape unwrapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad, missing or insufficiently scoped credential
    #[error("authentication failed: {message}")]
    Authentication {
        status: Option<u16>,
        message: String,
    },

    /// The addressed resource does not exist
    #[error("not found: {message}")]
    NotFound {
        status: Option<u16>,
        message: String,
    },

    /// Throttled upstream; `retry_after` is in seconds when the platform says
    #[error("rate limited: {message}")]
    RateLimited {
        status: Option<u16>,
        message: String,
        retry_after: Option<u64>,
    },

    /// Malformed caller input
    #[error("invalid argument: {message}")]
    Validation {
        status: Option<u16>,
        message: String,
    },

    /// 5xx, unexpected status, transport failure or undecodable body
    #[error("upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },
}

impl ApiError {
    /// Caller-side validation failure (no upstream status)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: None,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            status: None,
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            status: None,
            message: message.into(),
        }
    }

    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Upstream { .. } => ErrorKind::Upstream,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. }
            | Self::NotFound { status, .. }
            | Self::RateLimited { status, .. }
            | Self::Validation { status, .. }
            | Self::Upstream { status, .. } => *status,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Authentication { message, .. }
            | Self::NotFound { message, .. }
            | Self::RateLimited { message, .. }
            | Self::Validation { message, .. }
            | Self::Upstream { message, .. } => message,
        }
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Structured failure object returned to the agent
    pub fn to_json(&self) -> JsonValue {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.message(),
        });
        if let Some(status) = self.status() {
            error["status"] = json!(status);
        }
        if let Some(retry_after) = self.retry_after() {
            error["retry_after"] = json!(retry_after);
        }
        json!({ "ok": false, "error": error })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let message = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else if e.is_decode() {
            format!("failed to decode response: {}", e)
        } else {
            format!("request failed: {}", e)
        };
        Self::Upstream { status, message }
    }
}

/// Startup / dispatch error for ops-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ops-core
pub type Result<T> = std::result::Result<T, Error>;
