// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Committee Proxy Server Implementation
//!
//! This crate provides the HTTP server that relays committee datasets from the
//! Google Apps Script backend to the browser frontend, built with Axum.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and their JSON responses with proper status codes
//! - [`state`]: Shared application state and the root endpoint payload
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`middleware`]: Cross-origin policy
//! - [`metrics`]: Prometheus counters and the `/metrics` handler
//!
//! # Endpoints
//!
//! - `GET /`: service status and example requests
//! - `GET /api/committee?committee=<id>`: upstream dataset relayed verbatim,
//!   400 without an identifier, 502 when the upstream fails
//! - `GET /metrics`: Prometheus text format

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use shared_types::{CommitteeName, KnownCommittee};
pub use state::{ServerState, ServiceInfo};
