// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the committee proxy.

pub mod handlers;

use axum::{Router, routing::get};
use handlers::{committee_handler, service_info_handler};

use crate::{
    metrics::metrics_handler,
    state::{COMMITTEE_PATH, ServerState},
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(service_info_handler))
        .route(COMMITTEE_PATH, get(committee_handler))
        .route("/metrics", get(metrics_handler))
}
