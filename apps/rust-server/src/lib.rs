// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Todo API Server - Multi-tenant task list service
//!
//! Personal to-do lists behind bearer tokens issued by an external identity
//! provider and verified against its published key set.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification and identity resolution
//! - `storage` - Embedded redb store for users, task types, and todos
//! - `suggestions` - Upstream search-suggestion client

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod suggestions;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;
