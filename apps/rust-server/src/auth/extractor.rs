// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! The extractor reads the identity that [`auth_middleware`] placed in the
//! request extensions; it never verifies tokens themselves.
//!
//! [`auth_middleware`]: super::middleware::auth_middleware

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedUser};

/// Extractor for authenticated users.
///
/// Rejects anonymous requests with `401 not_authenticated`.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::NotAuthenticated)
    }
}
