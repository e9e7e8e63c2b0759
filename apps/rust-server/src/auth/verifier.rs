// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the issuer's key set.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::claims::VerifiedClaims;
use super::error::{AuthError, TokenRejection};
use super::jwks::{http_client, JwksManager};
use crate::config::AuthSettings;

/// The only accepted signing algorithm. Not configurable.
pub const ALLOWED_ALGORITHM: Algorithm = Algorithm::RS256;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies RS256 tokens issued by one issuer for one audience.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: JwksManager,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: JwksManager, issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(ALLOWED_ALGORITHM);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_nbf = true;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        Self { keys, validation }
    }

    /// Build a verifier and its key set cache from settings.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, reqwest::Error> {
        let keys = JwksManager::new(&settings.jwks_url, http_client(settings.jwks_timeout)?)
            .with_cache_ttl(settings.jwks_cache_ttl);
        Ok(Self::new(keys, &settings.issuer, &settings.audience))
    }

    pub fn keys(&self) -> &JwksManager {
        &self.keys
    }

    /// Verify a token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        let header = decode_header(token).map_err(|_| TokenRejection::Malformed)?;
        if header.alg != ALLOWED_ALGORITHM {
            return Err(TokenRejection::UnsupportedAlgorithm.into());
        }

        let kid = header.kid.ok_or(TokenRejection::UnknownKey)?;
        let key = self
            .keys
            .get_key(&kid)
            .await?
            .ok_or(TokenRejection::UnknownKey)?;

        let token_data = decode::<VerifiedClaims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| rejection_for(e.kind()))?;
        Ok(token_data.claims)
    }
}

fn rejection_for(kind: &ErrorKind) -> TokenRejection {
    match kind {
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        ErrorKind::ImmatureSignature => TokenRejection::NotYetValid,
        ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
        ErrorKind::InvalidIssuer => TokenRejection::InvalidIssuer,
        ErrorKind::InvalidAudience => TokenRejection::InvalidAudience,
        ErrorKind::InvalidAlgorithm => TokenRejection::UnsupportedAlgorithm,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "aud" => TokenRejection::InvalidAudience,
            "iss" => TokenRejection::InvalidIssuer,
            _ => TokenRejection::Malformed,
        },
        _ => TokenRejection::Malformed,
    }
}
