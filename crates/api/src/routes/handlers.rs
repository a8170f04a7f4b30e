// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! This module provides the root info handler and the committee proxy handler.

use std::time::Instant;

use axum::{
    Json,
    extract::{RawQuery, State},
    http::header,
    response::{IntoResponse, Response},
};
use external_apis::COMMITTEE_QUERY_PARAM;
use shared_types::CommitteeName;
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::{
    error::ServerError,
    metrics::{
        OUTCOME_MISSING_COMMITTEE, OUTCOME_SUCCESS, inc_committee_requests,
        observe_upstream_duration,
    },
    state::{ServerState, ServiceInfo},
};

/// Root endpoint handler
///
/// Reports service status, the advertised committee requests and the current
/// time. Query parameters are ignored.
pub async fn service_info_handler(State(state): State<ServerState>) -> Json<ServiceInfo> {
    Json(state.service_info())
}

/// Committee proxy handler
///
/// Forwards the `committee` query parameter to the upstream backend and relays
/// the JSON body unchanged.
///
/// # Errors
///
/// Returns `ServerError::MissingCommittee` (400) when the parameter is absent
/// or blank, and `ServerError::Upstream` (502) when the upstream is
/// unreachable, answers with a non-success status, or returns a body that is
/// not JSON.
pub async fn committee_handler(
    State(state): State<ServerState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ServerError> {
    let Some(committee) = CommitteeName::from_optional(committee_param(query.as_deref())) else {
        warn!("rejecting committee request without a committee parameter");
        inc_committee_requests(OUTCOME_MISSING_COMMITTEE);
        return Err(ServerError::MissingCommittee);
    };

    info!(%committee, "fetching data for committee");

    let started = Instant::now();
    let result = state.apps_script().fetch_committee(&committee).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(payload) => {
            observe_upstream_duration("success", elapsed);
            inc_committee_requests(OUTCOME_SUCCESS);
            match payload.record_count {
                Some(records) => {
                    info!(%committee, records, "successfully fetched committee records");
                }
                None => info!(%committee, "successfully fetched committee data"),
            }

            Ok((
                [(header::CONTENT_TYPE, "application/json")],
                payload.body,
            )
                .into_response())
        }
        Err(source) => {
            observe_upstream_duration("failure", elapsed);
            inc_committee_requests(source.kind());
            error!(
                %committee,
                kind = source.kind(),
                error = %source,
                "error fetching data for committee"
            );

            Err(ServerError::upstream(committee, source))
        }
    }
}

/// First `committee` value in a raw query string, percent-decoded
fn committee_param(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == COMMITTEE_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
}
