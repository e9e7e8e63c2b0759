// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs on every request. A request without credentials continues as
//! anonymous; protected handlers then reject it through the `Auth` extractor.
//! A request with a bad credential is answered here and never reaches a
//! handler.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::credential::Credential;
use super::resolver::IdentityResolver;
use super::verifier::TokenVerifier;
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Outcome of authenticating one request.
#[derive(Debug, Clone)]
pub enum Authentication {
    Identity(AuthenticatedUser),
    Anonymous,
}

/// Credential extraction, token verification, and identity resolution.
#[derive(Clone)]
pub struct Authenticator {
    verifier: TokenVerifier,
    resolver: IdentityResolver,
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier, resolver: IdentityResolver) -> Self {
        Self { verifier, resolver }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate a request from its headers.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Authentication, AuthError> {
        let token = match Credential::from_headers(headers) {
            Credential::Missing => return Ok(Authentication::Anonymous),
            Credential::Malformed(reason) => return Err(AuthError::MalformedCredential(reason)),
            Credential::Bearer(token) => token,
        };

        let claims = self.verifier.verify(&token).await?;

        let user = self.resolver.resolve(&claims)?;

        tracing::debug!(username = %user.username, "Authenticated request");
        Ok(Authentication::Identity(user))
    }
}

/// Authentication middleware function.
///
/// Inserts the [`AuthenticatedUser`] into request extensions on success.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_request(&state.authenticator, request.headers()).await {
        Ok(Authentication::Identity(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(Authentication::Anonymous) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

async fn authenticate_request(
    authenticator: &Arc<Authenticator>,
    headers: &HeaderMap,
) -> Result<Authentication, AuthError> {
    let result = authenticator.authenticate(headers).await;
    if let Err(e) = &result {
        match e {
            AuthError::KeySetUnavailable(detail) => {
                tracing::warn!(error = %detail, "Rejecting request, signing keys unavailable")
            }
            AuthError::Storage(_) => {}
            _ => tracing::debug!(error_code = e.error_code(), "Authentication failed"),
        }
    }
    result
}
