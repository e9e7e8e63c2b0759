// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every verification failure is folded into [`AuthError`] at the middleware
//! boundary and answered with one uniform JSON body. Messages describe the
//! failure class only; token contents never appear in them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Why a bearer token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Not a structurally valid JWT
    Malformed,
    /// Declared algorithm is not the one accepted algorithm
    UnsupportedAlgorithm,
    /// No `kid`, or no key with that id in the key set
    UnknownKey,
    /// Signature does not verify
    InvalidSignature,
    /// `exp` is in the past
    Expired,
    /// `nbf` is in the future
    NotYetValid,
    /// `aud` does not contain the configured audience
    InvalidAudience,
    /// `iss` is not the configured issuer
    InvalidIssuer,
}

impl TokenRejection {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenRejection::Malformed => "malformed_token",
            TokenRejection::UnsupportedAlgorithm => "unsupported_algorithm",
            TokenRejection::UnknownKey => "unknown_key",
            TokenRejection::InvalidSignature => "invalid_signature",
            TokenRejection::Expired => "token_expired",
            TokenRejection::NotYetValid => "token_not_yet_valid",
            TokenRejection::InvalidAudience => "invalid_audience",
            TokenRejection::InvalidIssuer => "invalid_issuer",
        }
    }
}

impl std::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            TokenRejection::Malformed => "token is malformed",
            TokenRejection::UnsupportedAlgorithm => "token algorithm is not accepted",
            TokenRejection::UnknownKey => "unable to find appropriate key",
            TokenRejection::InvalidSignature => "token signature is invalid",
            TokenRejection::Expired => "token has expired",
            TokenRejection::NotYetValid => "token is not yet valid",
            TokenRejection::InvalidAudience => "token audience is invalid",
            TokenRejection::InvalidIssuer => "token issuer is invalid",
        };
        f.write_str(message)
    }
}

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// `Authorization` header present but not `Bearer <token>`
    #[error("Invalid authorization header: {0}")]
    MalformedCredential(&'static str),

    /// Token failed verification
    #[error("Invalid token: {0}")]
    InvalidToken(TokenRejection),

    /// Verified token has no usable subject
    #[error("Invalid token payload: no subject claim")]
    InvalidClaims,

    /// Key set could not be fetched or parsed
    #[error("Signing keys are temporarily unavailable")]
    KeySetUnavailable(String),

    /// Anonymous request to an endpoint that needs an identity
    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    /// User lookup or creation failed
    #[error("Internal authentication error")]
    Storage(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedCredential(_) => "invalid_auth_header",
            AuthError::InvalidToken(rejection) => rejection.error_code(),
            AuthError::InvalidClaims => "invalid_claims",
            AuthError::KeySetUnavailable(_) => "key_set_unavailable",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::Storage(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MalformedCredential(_)
            | AuthError::InvalidToken(_)
            | AuthError::InvalidClaims
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::KeySetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenRejection> for AuthError {
    fn from(rejection: TokenRejection) -> Self {
        AuthError::InvalidToken(rejection)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (
            status,
            Json(AuthErrorBody {
                error: self.to_string(),
                error_code: self.error_code().to_string(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn not_authenticated_returns_401_with_challenge() {
        let response = AuthError::NotAuthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body = body_json(response).await;
        assert_eq!(body["error_code"], "not_authenticated");
    }

    #[tokio::test]
    async fn invalid_token_carries_reason_code() {
        let response = AuthError::InvalidToken(TokenRejection::Expired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error_code"], "token_expired");
        assert_eq!(body["error"], "Invalid token: token has expired");
    }

    #[tokio::test]
    async fn key_set_unavailable_is_503_and_hides_detail() {
        let response =
            AuthError::KeySetUnavailable("connect error to 10.0.0.1".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error_code"], "key_set_unavailable");
        assert!(!body["error"].as_str().unwrap().contains("10.0.0.1"));
    }

    #[test]
    fn every_rejection_maps_to_unauthorized() {
        for rejection in [
            TokenRejection::Malformed,
            TokenRejection::UnsupportedAlgorithm,
            TokenRejection::UnknownKey,
            TokenRejection::InvalidSignature,
            TokenRejection::Expired,
            TokenRejection::NotYetValid,
            TokenRejection::InvalidAudience,
            TokenRejection::InvalidIssuer,
        ] {
            assert_eq!(
                AuthError::from(rejection).status_code(),
                StatusCode::UNAUTHORIZED
            );
        }
    }
}
