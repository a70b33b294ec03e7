// SCB MCP - Statistics Sweden Model Context Protocol bridge
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for statistics API access.

use serde_json::{json, Value as JsonValue};
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Call quota exhausted for the current window.
    RateLimitExceeded,
    /// Unknown table or resource id.
    UpstreamNotFound,
    /// Selection rejected by the upstream after passing local validation.
    UpstreamValidationError,
    /// Any other non-2xx upstream response.
    UpstreamError,
    /// Local validation found unknown dimensions or categories.
    SelectionInvalid,
    /// Network or timeout failure.
    TransportError,
    /// Capability the upstream no longer exposes.
    FeatureUnavailable,
    /// Payload does not satisfy the JSON-stat2 structure.
    InvalidDataset,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimitExceeded => write!(f, "RateLimitExceeded"),
            Self::UpstreamNotFound => write!(f, "UpstreamNotFound"),
            Self::UpstreamValidationError => write!(f, "UpstreamValidationError"),
            Self::UpstreamError => write!(f, "UpstreamError"),
            Self::SelectionInvalid => write!(f, "SelectionInvalid"),
            Self::TransportError => write!(f, "TransportError"),
            Self::FeatureUnavailable => write!(f, "FeatureUnavailable"),
            Self::InvalidDataset => write!(f, "InvalidDataset"),
        }
    }
}

/// A non-2xx response from the upstream API.
///
/// The HTTP status and raw body are always kept so callers can report them
/// verbatim. `error_type` and `detail` are filled when the body carries a
/// problem-details envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamFailure {
    pub http_status: u16,
    pub status_text: String,
    pub error_type: Option<String>,
    pub detail: Option<String>,
    pub body: String,
    /// Seconds from a `Retry-After` header, if one was sent.
    pub retry_after: Option<u64>,
}

impl UpstreamFailure {
    /// Build a failure from a status line and raw body, extracting the
    /// upstream error envelope when the body is JSON.
    ///
    /// Two envelope shapes are recognised: RFC 7807 problem details at the
    /// top level (`{"type", "title", "status", "detail"}`) and the same
    /// fields nested under an `error` key.
    pub fn from_response(http_status: u16, status_text: impl Into<String>, body: String) -> Self {
        let mut failure = Self {
            http_status,
            status_text: status_text.into(),
            error_type: None,
            detail: None,
            body,
            retry_after: None,
        };

        if let Ok(parsed) = serde_json::from_str::<JsonValue>(&failure.body) {
            let envelope = match parsed.get("error") {
                Some(inner) if inner.is_object() => inner.clone(),
                _ => parsed,
            };
            failure.error_type = envelope
                .get("type")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            failure.detail = envelope
                .get("detail")
                .or_else(|| envelope.get("title"))
                .or_else(|| envelope.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        failure
    }

    pub fn with_retry_after(mut self, seconds: Option<u64>) -> Self {
        self.retry_after = seconds;
        self
    }

    /// Human-readable summary: the envelope detail when present, otherwise
    /// the status line plus a bounded prefix of the body.
    pub fn message(&self) -> String {
        match (&self.error_type, &self.detail) {
            (Some(t), Some(d)) => format!("{} ({})", d, t),
            (None, Some(d)) => d.clone(),
            _ => {
                let body: String = self.body.chars().take(500).collect();
                if body.trim().is_empty() {
                    format!("HTTP {} {}", self.http_status, self.status_text)
                } else {
                    format!("HTTP {} {}: {}", self.http_status, self.status_text, body)
                }
            }
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Errors surfaced to the tool layer.
#[derive(Debug, Clone, Error)]
pub enum ScbError {
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        reset_in_seconds: u64,
        /// Set when the upstream itself answered 429.
        upstream: Option<UpstreamFailure>,
    },

    #[error("Resource not found: {0}")]
    UpstreamNotFound(UpstreamFailure),

    #[error("Upstream rejected the request: {0}")]
    UpstreamValidation(UpstreamFailure),

    #[error("Upstream error: {0}")]
    Upstream(UpstreamFailure),

    #[error("Invalid selection: {message}")]
    SelectionInvalid {
        message: String,
        errors: Vec<String>,
        suggestions: Vec<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Feature not available: {message}")]
    FeatureUnavailable { feature: String, message: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

/// Result type for statistics API operations.
pub type ScbResult<T> = Result<T, ScbError>;

impl ScbError {
    /// Classify an upstream failure by HTTP status.
    pub fn from_upstream(failure: UpstreamFailure) -> Self {
        match failure.http_status {
            404 => Self::UpstreamNotFound(failure),
            // 403 is what the API answers when a selection exceeds the cell limit.
            400 | 403 | 413 | 422 => Self::UpstreamValidation(failure),
            429 => Self::RateLimitExceeded {
                message: format!("upstream refused the call: {}", failure.message()),
                reset_in_seconds: failure.retry_after.unwrap_or(10),
                upstream: Some(failure),
            },
            _ => Self::Upstream(failure),
        }
    }

    pub fn feature_unavailable(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FeatureUnavailable {
            feature: feature.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Self::UpstreamNotFound(_) => ErrorKind::UpstreamNotFound,
            Self::UpstreamValidation(_) => ErrorKind::UpstreamValidationError,
            Self::Upstream(_) => ErrorKind::UpstreamError,
            Self::SelectionInvalid { .. } => ErrorKind::SelectionInvalid,
            Self::Transport(_) => ErrorKind::TransportError,
            Self::FeatureUnavailable { .. } => ErrorKind::FeatureUnavailable,
            Self::InvalidDataset(_) => ErrorKind::InvalidDataset,
        }
    }

    /// The upstream response behind this error, if there was one.
    pub fn upstream(&self) -> Option<&UpstreamFailure> {
        match self {
            Self::UpstreamNotFound(f) | Self::UpstreamValidation(f) | Self::Upstream(f) => Some(f),
            Self::RateLimitExceeded { upstream, .. } => upstream.as_ref(),
            _ => None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        self.upstream().map(|f| f.http_status)
    }

    /// Structured representation returned to tool callers.
    pub fn to_json(&self) -> JsonValue {
        let mut error = json!({
            "kind": self.kind().to_string(),
            "message": self.to_string(),
        });

        if let Some(failure) = self.upstream() {
            error["http_status"] = json!(failure.http_status);
            error["body"] = json!(failure.body);
            if let Some(t) = &failure.error_type {
                error["upstream_type"] = json!(t);
            }
        }

        match self {
            Self::RateLimitExceeded {
                reset_in_seconds, ..
            } => {
                error["reset_in_seconds"] = json!(reset_in_seconds);
                error["retry_advice"] = json!("Wait for the window to reset before retrying");
            }
            Self::SelectionInvalid {
                errors,
                suggestions,
                ..
            } => {
                error["errors"] = json!(errors);
                error["suggestions"] = json!(suggestions);
            }
            Self::FeatureUnavailable { feature, .. } => {
                error["feature"] = json!(feature);
            }
            _ => {}
        }

        json!({ "error": error })
    }
}
