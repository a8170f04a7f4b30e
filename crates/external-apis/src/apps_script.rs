// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Google Apps Script committee backend
//!
//! The backend is a published Apps Script web app that answers
//! `GET <base>?committee=<id>` with a JSON document. The client issues exactly
//! one request per call, follows the redirect Apps Script answers with, and
//! hands back the body text untouched once it has been checked to be JSON.

use std::{error::Error as _, fmt, time::Duration};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, header::ACCEPT};
use serde::{
    Deserialize, Deserializer,
    de::{IgnoredAny, MapAccess, SeqAccess, Visitor},
};
use shared_types::CommitteeName;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

/// Query parameter carrying the committee identifier upstream
pub const COMMITTEE_QUERY_PARAM: &str = "committee";

const USER_AGENT: &str = concat!("committee-proxy/", env!("CARGO_PKG_VERSION"));

/// Characters left unescaped by JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Configuration for the Apps Script client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppsScriptConfig {
    /// Deployed web app URL, without the committee parameter
    pub base_url: Url,
    /// Upper bound for the whole exchange; `None` leaves it to the transport
    pub timeout_seconds: Option<u64>,
}

impl AppsScriptConfig {
    /// Create a configuration from a base URL string
    ///
    /// # Errors
    ///
    /// Returns `AppsScriptError::Config` if the URL cannot be parsed
    pub fn new(base_url: &str) -> Result<Self, AppsScriptError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppsScriptError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            timeout_seconds: None,
        })
    }

    /// Set an upper bound for each upstream exchange
    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }
}

/// Errors produced while fetching a committee dataset
#[derive(Debug, Error)]
pub enum AppsScriptError {
    /// The request could not be sent or the body could not be read
    #[error("{}", transport_details(.error))]
    Transport {
        /// Underlying HTTP client error
        error: reqwest::Error,
    },

    /// The upstream answered with a non-success status
    #[error("Google Apps Script responded with status {status}")]
    Status {
        /// HTTP status code returned upstream
        status: u16,
    },

    /// The upstream answered 2xx but the body is not JSON
    #[error("Invalid JSON response from Google Apps Script: {error}")]
    Payload {
        /// Parse error for the body
        error: serde_json::Error,
    },

    /// The configured timeout elapsed before the exchange completed
    #[error("Google Apps Script did not respond within {seconds} seconds")]
    Timeout {
        /// Timeout that elapsed
        seconds: u64,
    },

    /// The client was configured with invalid values
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppsScriptError {
    /// Short label for the failure class, used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => "upstream_transport",
            Self::Status { .. } => "upstream_status",
            Self::Payload { .. } => "upstream_payload",
            Self::Config(_) => "configuration",
        }
    }
}

/// Renders a transport error together with its causes
///
/// `reqwest` keeps the interesting part (connection refused, DNS failure) in
/// the source chain rather than in its own message.
fn transport_details(error: &reqwest::Error) -> String {
    let mut details = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        details.push_str(": ");
        details.push_str(&cause.to_string());
        source = cause.source();
    }
    details
}

/// A validated committee dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteePayload {
    /// Upstream body, exactly as received
    pub body: String,
    /// Number of records when the document is a JSON array
    pub record_count: Option<usize>,
}

impl CommitteePayload {
    /// Validate an upstream body and wrap it
    ///
    /// Nesting depth is not limited; the stack grows on the heap as needed.
    ///
    /// # Errors
    ///
    /// Returns `AppsScriptError::Payload` if the body is not syntactically valid JSON
    pub fn from_body(body: String) -> Result<Self, AppsScriptError> {
        let shape = document_shape(&body).map_err(|error| AppsScriptError::Payload { error })?;
        Ok(Self {
            body,
            record_count: shape.record_count,
        })
    }
}

fn document_shape(body: &str) -> Result<DocumentShape, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(body);
    json.disable_recursion_limit();
    let shape = DocumentShape::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(shape)
}

/// Top-level shape of an upstream document, read without keeping its contents
struct DocumentShape {
    record_count: Option<usize>,
}

impl<'de> Deserialize<'de> for DocumentShape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentShapeVisitor)
    }
}

impl DocumentShape {
    const NOT_AN_ARRAY: Self = Self { record_count: None };
}

struct DocumentShapeVisitor;

impl<'de> Visitor<'de> for DocumentShapeVisitor {
    type Value = DocumentShape;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a JSON document")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut records = 0;
        while seq.next_element::<IgnoredAny>()?.is_some() {
            records += 1;
        }
        Ok(DocumentShape {
            record_count: Some(records),
        })
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }

    fn visit_str<E>(self, _: &str) -> Result<Self::Value, E> {
        Ok(DocumentShape::NOT_AN_ARRAY)
    }
}

/// Client for the Apps Script committee backend
#[derive(Debug, Clone)]
pub struct AppsScriptClient {
    client: Client,
    config: AppsScriptConfig,
}

impl AppsScriptClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `AppsScriptError::Config` if the base URL is not an absolute
    /// `http`/`https` URL or the HTTP client cannot be built
    pub fn new(config: AppsScriptConfig) -> Result<Self, AppsScriptError> {
        let base_url = &config.base_url;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(AppsScriptError::Config(format!(
                "base URL must be an absolute http(s) URL, got '{base_url}'"
            )));
        }

        if config.timeout_seconds == Some(0) {
            return Err(AppsScriptError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppsScriptError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Upstream URL for a committee
    ///
    /// The identifier is escaped the way `encodeURIComponent` does it, so a
    /// space becomes `%20`. A query already present on the base URL is kept.
    pub fn committee_url(&self, committee: &CommitteeName) -> Url {
        let encoded = utf8_percent_encode(committee.as_str(), COMPONENT);
        let parameter = format!("{COMMITTEE_QUERY_PARAM}={encoded}");

        let mut url = self.config.base_url.clone();
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{parameter}"),
            _ => parameter,
        };
        url.set_query(Some(&query));
        url
    }

    /// Fetch the dataset for a committee
    ///
    /// Issues a single GET, with no retry, and validates the body is JSON
    /// before returning it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Transport` when the request or body read fails, `Status` for a
    /// non-2xx answer, `Payload` for a body that is not JSON and `Timeout`
    /// when a configured timeout elapses
    pub async fn fetch_committee(
        &self,
        committee: &CommitteeName,
    ) -> Result<CommitteePayload, AppsScriptError> {
        let url = self.committee_url(committee);
        debug!(%url, %committee, "fetching committee data from Google Apps Script");

        let exchange = async {
            let response = self
                .client
                .get(url)
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|error| AppsScriptError::Transport { error })?;

            let status = response.status();
            if !status.is_success() {
                warn!(
                    status = status.as_u16(),
                    %committee,
                    "Google Apps Script returned a non-success status"
                );
                return Err(AppsScriptError::Status {
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|error| AppsScriptError::Transport { error })
        };

        let body = match self.config.timeout_seconds {
            Some(seconds) => timeout(Duration::from_secs(seconds), exchange)
                .await
                .map_err(|_| AppsScriptError::Timeout { seconds })??,
            None => exchange.await?,
        };

        CommitteePayload::from_body(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> AppsScriptClient {
        AppsScriptClient::new(AppsScriptConfig::new(base_url).unwrap()).unwrap()
    }

    fn committee(value: &str) -> CommitteeName {
        CommitteeName::new(value).unwrap()
    }

    #[test]
    fn committee_url_encodes_spaces_as_percent_20() {
        let client = client("https://script.example.com/macros/s/deployment/exec");
        let url = client.committee_url(&committee("UN Women"));

        assert!(url.as_str().ends_with("/exec?committee=UN%20Women"));
    }

    #[test]
    fn committee_url_matches_encode_uri_component() {
        let client = client("https://script.example.com/exec");

        let url = client.committee_url(&committee("a&b=c/d?e+f"));
        assert_eq!(url.query(), Some("committee=a%26b%3Dc%2Fd%3Fe%2Bf"));

        let url = client.committee_url(&committee("F1-_.!~*()"));
        assert_eq!(url.query(), Some("committee=F1-_.!~*()"));

        let url = client.committee_url(&committee("Comité"));
        assert_eq!(url.query(), Some("committee=Comit%C3%A9"));
    }

    #[test]
    fn committee_url_keeps_existing_query() {
        let client = client("https://script.example.com/exec?sheet=main");
        let url = client.committee_url(&committee("F1"));

        assert_eq!(url.query(), Some("sheet=main&committee=F1"));
    }

    #[test]
    fn committee_url_is_built_fresh_each_time() {
        let client = client("https://script.example.com/exec");
        client.committee_url(&committee("AIPPM"));
        let url = client.committee_url(&committee("UNODC"));

        assert_eq!(url.query(), Some("committee=UNODC"));
        assert_eq!(client.base_url().query(), None);
    }

    #[test]
    fn rejects_non_http_base_urls() {
        let config = AppsScriptConfig::new("ftp://example.com/data").unwrap();
        let result = AppsScriptClient::new(config);
        assert!(matches!(result, Err(AppsScriptError::Config(_))));

        let config = AppsScriptConfig::new("mailto:someone@example.com").unwrap();
        assert!(AppsScriptClient::new(config).is_err());
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = AppsScriptConfig::new("not a url");
        match result {
            Err(AppsScriptError::Config(message)) => assert!(message.contains("invalid base URL")),
            other => panic!("Expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = AppsScriptConfig::new("https://script.example.com/exec")
            .unwrap()
            .with_timeout_seconds(0);
        assert!(matches!(
            AppsScriptClient::new(config),
            Err(AppsScriptError::Config(_))
        ));
    }

    #[test]
    fn payload_counts_array_records() {
        let payload = CommitteePayload::from_body(r#"[{"a":1},{"a":2}]"#.to_string()).unwrap();
        assert_eq!(payload.record_count, Some(2));
        assert_eq!(payload.body, r#"[{"a":1},{"a":2}]"#);
    }

    #[test]
    fn payload_without_array_has_no_count() {
        let payload = CommitteePayload::from_body(r#"{"rows": []}"#.to_string()).unwrap();
        assert_eq!(payload.record_count, None);
    }

    #[test]
    fn payload_scalars_and_objects_have_no_count() {
        for body in ["null", "true", "42", "-1.5", r#""text""#, r#"{"a":[1,2]}"#] {
            let payload = CommitteePayload::from_body(body.to_string()).unwrap();
            assert_eq!(payload.record_count, None, "{body}");
        }
    }

    #[test]
    fn payload_accepts_deep_nesting() {
        let body = format!("{}{}", "[".repeat(200), "]".repeat(200));
        let payload = CommitteePayload::from_body(body.clone()).unwrap();
        assert_eq!(payload.body, body);
        assert_eq!(payload.record_count, Some(1));

        let body = format!("{}{}", r#"{"a":["#.repeat(20_000), "]}".repeat(20_000));
        assert!(CommitteePayload::from_body(body).is_ok());
    }

    #[test]
    fn payload_rejects_trailing_data() {
        let result = CommitteePayload::from_body("[] []".to_string());
        assert!(matches!(result, Err(AppsScriptError::Payload { .. })));

        let result = CommitteePayload::from_body(format!("{}]", "[".repeat(300)));
        assert!(matches!(result, Err(AppsScriptError::Payload { .. })));
    }

    #[test]
    fn payload_rejects_invalid_json() {
        let result = CommitteePayload::from_body("not json".to_string());
        let error = result.unwrap_err();
        assert_eq!(error.kind(), "upstream_payload");
        assert!(
            error
                .to_string()
                .starts_with("Invalid JSON response from Google Apps Script:")
        );
    }

    #[test]
    fn status_error_mentions_code() {
        let error = AppsScriptError::Status { status: 500 };
        assert_eq!(
            error.to_string(),
            "Google Apps Script responded with status 500"
        );
        assert_eq!(error.kind(), "upstream_status");
    }
}
