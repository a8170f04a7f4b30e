// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the server error type and its mapping onto HTTP
//! responses. Every error renders as a JSON object with an `error` field.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use external_apis::AppsScriptError;
use shared_types::{CommitteeName, KnownCommittee};
use thiserror::Error;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// The request did not name a committee
    #[error("Missing 'committee' query parameter.")]
    MissingCommittee,

    /// The upstream could not provide a valid dataset
    #[error("Failed to fetch data from Google Apps Script")]
    Upstream {
        /// Committee that was requested
        committee: CommitteeName,
        /// What went wrong upstream
        #[source]
        source: AppsScriptError,
        /// When the failure was observed
        timestamp: DateTime<Utc>,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Wrap an upstream failure for a committee, stamped with the current time
    pub fn upstream(committee: CommitteeName, source: AppsScriptError) -> Self {
        Self::Upstream {
            committee,
            source,
            timestamp: Utc::now(),
        }
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCommittee => StatusCode::BAD_REQUEST,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::TaskJoin { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert error to JSON response body
    pub fn to_json_response(&self) -> serde_json::Value {
        match self {
            Self::MissingCommittee => serde_json::json!({
                "error": self.to_string(),
                "availableCommittees": KnownCommittee::ALL,
            }),
            Self::Upstream {
                committee,
                source,
                timestamp,
            } => serde_json::json!({
                "error": self.to_string(),
                "committee": committee,
                "details": source.to_string(),
                "timestamp": format_timestamp(*timestamp),
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "status": self.status_code().as_u16(),
            }),
        }
    }
}

/// Format a timestamp the way JavaScript's `toISOString` does
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json_response())).into_response()
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn missing_committee_lists_known_committees() {
        let error = ServerError::MissingCommittee;
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let body = error.to_json_response();
        assert_eq!(body["error"], "Missing 'committee' query parameter.");
        assert_eq!(
            body["availableCommittees"],
            serde_json::json!(["AIPPM", "F1", "UNWomen", "UNODC"])
        );
    }

    #[test]
    fn upstream_error_body_shape() {
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let error = ServerError::Upstream {
            committee: CommitteeName::new("UN Women").unwrap(),
            source: AppsScriptError::Status { status: 503 },
            timestamp,
        };
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);

        let body = error.to_json_response();
        assert_eq!(body["error"], "Failed to fetch data from Google Apps Script");
        assert_eq!(body["committee"], "UN Women");
        assert_eq!(
            body["details"],
            "Google Apps Script responded with status 503"
        );
        assert_eq!(body["timestamp"], "2025-03-14T09:26:53.000Z");
    }

    #[test]
    fn process_errors_are_internal() {
        let error = ServerError::Config {
            message: "bad".to_string(),
        };
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_json_response()["status"], 500);
    }

    #[test]
    fn into_response_uses_status_code() {
        let response = ServerError::MissingCommittee.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ServerError::upstream(KnownCommittee::F1.into(), AppsScriptError::Status { status: 500 })
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
