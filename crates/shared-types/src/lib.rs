// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the committee proxy service
//!
//! This crate provides the committee identifier types shared by the upstream
//! client and the HTTP server, avoiding circular dependencies.

pub mod committee;

pub use committee::{CommitteeName, InvalidCommitteeName, KnownCommittee};
