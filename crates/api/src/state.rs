// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the committee proxy,
//! including configuration, the upstream client, and coordinated cancellation.

use std::sync::Arc;

use chrono::Utc;
use external_apis::AppsScriptClient;
use serde::{Deserialize, Serialize};
use shared_types::KnownCommittee;
use tokio_util::sync::CancellationToken;

use crate::{config::ServerConfig, error::format_timestamp};

/// Status line reported by the root endpoint
pub const SERVICE_STATUS: &str = "Committee proxy is running";

/// Path of the committee proxy endpoint
pub const COMMITTEE_PATH: &str = "/api/committee";

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: Arc<ServerConfig>,
    /// Client for the upstream committee backend
    apps_script: Arc<AppsScriptClient>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `apps_script` - Client for the upstream committee backend
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        apps_script: Arc<AppsScriptClient>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config: Arc::new(config),
            apps_script,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Client for the upstream committee backend
    pub fn apps_script(&self) -> &AppsScriptClient {
        &self.apps_script
    }

    /// Describe the running service
    pub fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            status: SERVICE_STATUS.to_string(),
            endpoints: committee_endpoints(),
            timestamp: format_timestamp(Utc::now()),
        }
    }
}

/// Example request path for a committee
pub fn committee_endpoint(committee: KnownCommittee) -> String {
    format!("{COMMITTEE_PATH}?committee={committee}")
}

/// Example request paths, one per advertised committee
pub fn committee_endpoints() -> Vec<String> {
    KnownCommittee::ALL.into_iter().map(committee_endpoint).collect()
}

/// Payload of the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service status
    pub status: String,
    /// Example committee requests
    pub endpoints: Vec<String>,
    /// Timestamp
    pub timestamp: String,
}
