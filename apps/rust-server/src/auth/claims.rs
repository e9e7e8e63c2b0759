// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::StoredUser;

/// Audience claim, which issuers send either as one string or as a list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

/// Claims of a token whose signature, issuer, audience and lifetime have
/// been checked. Claims not listed here are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    /// Subject. Defaults to empty so a missing claim is reported as
    /// `InvalidClaims` rather than a malformed token.
    #[serde(default)]
    pub sub: String,

    pub aud: Audience,

    pub iss: String,

    /// Expiration timestamp
    pub exp: i64,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub nbf: Option<i64>,
}

/// Authenticated user information.
///
/// This is the primary type used throughout the application to represent
/// the user making a request. Inserted into request extensions by the
/// authentication middleware.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Local user ID (UUID)
    pub user_id: String,

    /// Username, equal to the token subject
    pub username: String,
}

impl From<StoredUser> for AuthenticatedUser {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
        }
    }
}
