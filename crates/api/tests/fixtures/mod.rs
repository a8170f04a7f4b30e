// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for the committee proxy
//!
//! Starts a proxy wired to a wiremock upstream and provides sample datasets.

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use url::Url;
use wiremock::MockServer;

/// Path the mock upstream serves the Apps Script deployment on
pub const EXEC_PATH: &str = "/macros/s/test-deployment/exec";

/// Origin allowed by the testing configuration
pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Two delegate rows as the Apps Script backend renders them
pub const DELEGATES_BODY: &str = r#"[{"Name":"Asha Rao","Portfolio":"Shashi Tharoor","Score":42},{"Name":"Ben Ortiz","Portfolio":"Jairam Ramesh","Score":37}]"#;

/// Upstream base URL for a mock server
pub fn upstream_url(mock_server: &MockServer) -> Url {
    Url::parse(&format!("{}{EXEC_PATH}", mock_server.uri())).expect("mock server URI is valid")
}

/// Start a proxy with the given configuration
pub async fn spawn_proxy_with(config: ServerConfig) -> SocketAddr {
    let (addr, _) = Server::new(config, ShutdownConfig::default())
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server");
    addr
}

/// Start a proxy pointed at the given upstream base URL
pub async fn spawn_proxy_for(upstream: Url) -> SocketAddr {
    spawn_proxy_with(ServerConfig::for_testing(upstream)).await
}

/// Start a proxy pointed at a mock upstream
pub async fn spawn_proxy(mock_server: &MockServer) -> SocketAddr {
    spawn_proxy_for(upstream_url(mock_server)).await
}
