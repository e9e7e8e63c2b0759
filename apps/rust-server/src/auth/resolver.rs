// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Maps verified token subjects to local user records.

use std::sync::Arc;

use super::claims::{AuthenticatedUser, VerifiedClaims};
use super::error::AuthError;
use crate::storage::{StorageError, StoredUser, TodoDatabase};

/// Resolves (and on first sight creates) the user behind a token subject.
#[derive(Clone)]
pub struct IdentityResolver {
    database: Arc<TodoDatabase>,
}

impl IdentityResolver {
    pub fn new(database: Arc<TodoDatabase>) -> Self {
        Self { database }
    }

    /// Return the user for the claims' subject, creating it if needed.
    pub fn resolve(&self, claims: &VerifiedClaims) -> Result<AuthenticatedUser, AuthError> {
        let username = claims.sub.as_str();
        if username.trim().is_empty() {
            return Err(AuthError::InvalidClaims);
        }

        let user = self.get_or_create(username).map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve user");
            AuthError::Storage(e.to_string())
        })?;
        Ok(user.into())
    }

    fn get_or_create(&self, username: &str) -> Result<StoredUser, StorageError> {
        let users = self.database.users();
        if let Some(user) = users.get_by_username(username)? {
            return Ok(user);
        }

        match users.create(username) {
            Ok(user) => {
                tracing::info!(username, "Created user on first sign-in");
                Ok(user)
            }
            // Lost a race with a concurrent first request
            Err(StorageError::AlreadyExists(_)) => users
                .get_by_username(username)?
                .ok_or_else(|| StorageError::NotFound(format!("User {username}"))),
            Err(e) => Err(e),
        }
    }
}
