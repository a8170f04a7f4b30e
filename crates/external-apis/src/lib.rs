// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Upstream integration for committee datasets
//!
//! The committee data lives behind a Google Apps Script web app. This crate
//! owns the single outbound call the proxy makes and classifies its outcome.
//!
//! # Architecture
//!
//! - **Client**: [`apps_script::AppsScriptClient`] builds the upstream URL, issues one GET
//!   per request, and validates that the body is well-formed JSON
//! - **Errors**: [`apps_script::AppsScriptError`] separates transport, status and payload failures
//!   so callers can pick a response without inspecting messages
//!
//! Requests are never retried and responses are never cached.

pub mod apps_script;

pub use apps_script::*;
