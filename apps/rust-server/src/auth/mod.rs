// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication against an external identity provider.
//!
//! ## Auth Flow
//!
//! 1. The client signs in with the identity provider
//! 2. The client sends `Authorization: Bearer <JWT>` (browsers may send the
//!    `access_token` cookie instead)
//! 3. The server:
//!    - Fetches the provider's JWKS via HTTPS and caches it
//!    - Verifies the RS256 signature, expiry, issuer, and audience
//!    - Maps `sub` to a local user, creating it on first sight
//!
//! ## Security
//!
//! - RS256 is the only accepted algorithm
//! - Requests without credentials are anonymous; every `/api` handler
//!   requires an identity through the [`Auth`] extractor
//! - A key set that cannot be fetched fails the request (503), never
//!   downgrades it to anonymous
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod credential;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod resolver;
pub mod verifier;

pub use claims::{AuthenticatedUser, VerifiedClaims};
pub use error::{AuthError, TokenRejection};
pub use extractor::Auth;
pub use jwks::JwksManager;
pub use middleware::{auth_middleware, Authentication, Authenticator};
pub use resolver::IdentityResolver;
pub use verifier::TokenVerifier;
