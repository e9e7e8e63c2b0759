// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behaviour
//!
//! - The key set is held as an immutable snapshot (`Arc<HashMap<kid, key>>`)
//!   that is swapped wholesale on refresh; readers never see a partial set
//! - A snapshot older than the TTL is refreshed before use
//! - An unknown `kid` on a fresh snapshot triggers one refresh so rotated keys
//!   are picked up immediately, at most once per `min_refresh_interval`
//! - Refreshes are serialized; concurrent misses cause a single fetch
//! - Fetch failures are fail-closed: no stale fallback, the caller gets
//!   `KeySetUnavailable`
//! - After a failed fetch, further fetches are suppressed for
//!   `min_refresh_interval`; callers in that window fail immediately

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum time between refreshes caused by unknown key ids.
const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Default timeout for the key set request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Key set document as published by the issuer.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<RawJwk>,
}

/// A single published key. Fields beyond these are ignored.
#[derive(Debug, Deserialize)]
struct RawJwk {
    kid: Option<String>,
    kty: String,
    #[serde(rename = "use")]
    usage: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// An RSA signing key from the issuer's key set.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub key_type: String,
    pub usage: Option<String>,
    /// Base64url modulus
    pub n: String,
    /// Base64url exponent
    pub e: String,
    decoding_key: DecodingKey,
}

impl SigningKey {
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("key_type", &self.key_type)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Last failed fetch, kept so waiters do not retry a dead endpoint.
struct FailedFetch {
    at: Instant,
    detail: String,
}

/// Immutable view of the key set at one point in time.
struct Snapshot {
    keys: Arc<HashMap<String, SigningKey>>,
    fetched_at: Instant,
}

/// Key set cache.
///
/// Cloning is cheap and clones share the same snapshot.
#[derive(Clone)]
pub struct JwksManager {
    /// Key set URL
    jwks_url: String,
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    snapshot: Arc<RwLock<Option<Snapshot>>>,
    /// Serializes fetches and holds the most recent failure
    refresh_lock: Arc<Mutex<Option<FailedFetch>>>,
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new key set cache.
    ///
    /// `client` should carry a request timeout; see [`http_client`].
    pub fn new(jwks_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            snapshot: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(None)),
            client,
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the minimum spacing of refreshes triggered by unknown key ids.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Look up a signing key by key id.
    ///
    /// Returns `Ok(None)` when the issuer does not publish the key.
    pub async fn get_key(&self, kid: &str) -> Result<Option<SigningKey>, AuthError> {
        let keys = match self.fresh_keys().await {
            Some(keys) => keys,
            None => self.refresh_if_older_than(self.cache_ttl).await?,
        };
        if let Some(key) = keys.get(kid) {
            return Ok(Some(key.clone()));
        }

        // Possibly a rotated key: refetch unless we just did
        let keys = self.refresh_if_older_than(self.min_refresh_interval).await?;
        Ok(keys.get(kid).cloned())
    }

    /// Make sure a fresh key set is cached, fetching only if the cached one
    /// has expired.
    pub async fn ensure_fresh(&self) -> Result<(), AuthError> {
        if self.is_cached().await {
            return Ok(());
        }
        self.refresh_if_older_than(self.cache_ttl).await.map(|_| ())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        self.fresh_keys().await.is_some()
    }

    async fn fresh_keys(&self) -> Option<Arc<HashMap<String, SigningKey>>> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .as_ref()
            .filter(|s| s.fetched_at.elapsed() < self.cache_ttl)
            .map(|s| Arc::clone(&s.keys))
    }

    /// Refetch unless another caller refreshed within `max_age`.
    async fn refresh_if_older_than(
        &self,
        max_age: Duration,
    ) -> Result<Arc<HashMap<String, SigningKey>>, AuthError> {
        let mut last_failure = self.refresh_lock.lock().await;

        // Re-check under the refresh lock; a concurrent caller may have fetched
        {
            let snapshot = self.snapshot.read().await;
            if let Some(s) = snapshot.as_ref() {
                if !max_age.is_zero() && s.fetched_at.elapsed() < max_age {
                    return Ok(Arc::clone(&s.keys));
                }
            }
        }

        if let Some(failure) = last_failure.as_ref() {
            if failure.at.elapsed() < self.min_refresh_interval {
                return Err(AuthError::KeySetUnavailable(failure.detail.clone()));
            }
        }

        let keys = match self.fetch_jwks().await {
            Ok(keys) => Arc::new(keys),
            Err(err) => {
                let detail = match &err {
                    AuthError::KeySetUnavailable(detail) => detail.clone(),
                    other => other.to_string(),
                };
                *last_failure = Some(FailedFetch {
                    at: Instant::now(),
                    detail,
                });
                return Err(err);
            }
        };
        *last_failure = None;
        tracing::debug!(keys = keys.len(), url = %self.jwks_url, "Fetched signing key set");

        let mut snapshot = self.snapshot.write().await;
        *snapshot = Some(Snapshot {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        Ok(keys)
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<HashMap<String, SigningKey>, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| unavailable(&self.jwks_url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(
                &self.jwks_url,
                format!("HTTP {} from JWKS endpoint", response.status()),
            ));
        }

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| unavailable(&self.jwks_url, e.to_string()))?;

        Ok(parse_keys(document))
    }
}

fn unavailable(url: &str, detail: String) -> AuthError {
    tracing::warn!(url, error = %detail, "Signing key set unavailable");
    AuthError::KeySetUnavailable(detail)
}

/// Keep usable RSA signing keys, indexed by key id.
fn parse_keys(document: JwksDocument) -> HashMap<String, SigningKey> {
    let mut keys = HashMap::with_capacity(document.keys.len());
    for raw in document.keys {
        let Some(kid) = raw.kid else {
            continue;
        };
        if raw.kty != "RSA" {
            tracing::debug!(%kid, kty = %raw.kty, "Skipping non-RSA key");
            continue;
        }
        if raw.usage.as_deref().is_some_and(|u| u != "sig") {
            tracing::debug!(%kid, "Skipping key not meant for signatures");
            continue;
        }
        let (Some(n), Some(e)) = (raw.n, raw.e) else {
            continue;
        };
        let decoding_key = match DecodingKey::from_rsa_components(&n, &e) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(%kid, error = %err, "Skipping unusable RSA key");
                continue;
            }
        };
        keys.insert(
            kid.clone(),
            SigningKey {
                kid,
                key_type: raw.kty,
                usage: raw.usage,
                n,
                e,
                decoding_key,
            },
        );
    }
    keys
}

/// Build an HTTP client with a request timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_jwks_server, test_jwks, TEST_KID};

    fn manager(url: &str) -> JwksManager {
        JwksManager::new(url, http_client(Duration::from_secs(2)).unwrap())
    }

    #[test]
    fn parse_keeps_only_rsa_signing_keys() {
        let document: JwksDocument = serde_json::from_value(serde_json::json!({
            "keys": [
                test_jwks()["keys"][0].clone(),
                { "kid": "enc", "kty": "RSA", "use": "enc", "n": "AQAB", "e": "AQAB" },
                { "kid": "ec", "kty": "EC", "crv": "P-256", "x": "a", "y": "b" },
                { "kty": "RSA", "use": "sig", "n": "AQAB", "e": "AQAB" },
                { "kid": "partial", "kty": "RSA" }
            ]
        }))
        .unwrap();

        let keys = parse_keys(document);
        assert_eq!(keys.len(), 1);
        let key = &keys[TEST_KID];
        assert_eq!(key.kid, TEST_KID);
        assert_eq!(key.key_type, "RSA");
        assert_eq!(key.usage.as_deref(), Some("sig"));
        assert_eq!(key.e, "AQAB");
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = manager("https://example.com/.well-known/jwks.json");
        assert!(!manager.is_cached().await);
    }

    #[tokio::test]
    async fn fetches_once_within_ttl() {
        let server = spawn_jwks_server(test_jwks()).await;
        let manager = manager(&server.url);

        assert!(manager.get_key(TEST_KID).await.unwrap().is_some());
        assert!(manager.get_key(TEST_KID).await.unwrap().is_some());
        assert!(manager.is_cached().await);
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn expired_snapshot_is_refetched() {
        let server = spawn_jwks_server(test_jwks()).await;
        let manager = manager(&server.url).with_cache_ttl(Duration::ZERO);

        manager.get_key(TEST_KID).await.unwrap();
        manager.get_key(TEST_KID).await.unwrap();
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn unknown_kid_refreshes_at_most_once_per_interval() {
        let server = spawn_jwks_server(test_jwks()).await;
        let manager = manager(&server.url).with_min_refresh_interval(Duration::from_secs(60));

        // First lookup populates the cache; the miss does not refetch a
        // snapshot that is only milliseconds old
        assert!(manager.get_key("rotated").await.unwrap().is_none());
        assert!(manager.get_key("rotated").await.unwrap().is_none());
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_picks_up_rotated_key() {
        let server = spawn_jwks_server(serde_json::json!({ "keys": [] })).await;
        let manager = manager(&server.url).with_min_refresh_interval(Duration::ZERO);

        assert!(manager.get_key(TEST_KID).await.unwrap().is_none());

        server.set_body(test_jwks());
        assert!(manager.get_key(TEST_KID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn malformed_document_is_unavailable() {
        let server = spawn_jwks_server(serde_json::json!({ "not_keys": true })).await;
        let manager = manager(&server.url);

        let result = manager.get_key(TEST_KID).await;
        assert!(matches!(result, Err(AuthError::KeySetUnavailable(_))));
        assert!(!manager.is_cached().await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let manager = manager("http://127.0.0.1:9/.well-known/jwks.json");
        let result = manager.get_key(TEST_KID).await;
        assert!(matches!(result, Err(AuthError::KeySetUnavailable(_))));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = spawn_jwks_server(test_jwks()).await;
        server.set_delay(Duration::from_secs(2));
        let manager = JwksManager::new(
            server.url.clone(),
            http_client(Duration::from_millis(200)).unwrap(),
        );

        let started = Instant::now();
        let result = manager.get_key(TEST_KID).await;
        assert!(matches!(result, Err(AuthError::KeySetUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn concurrent_lookups_against_slow_endpoint_fail_together() {
        let server = spawn_jwks_server(test_jwks()).await;
        server.set_delay(Duration::from_secs(5));
        let manager = JwksManager::new(
            server.url.clone(),
            http_client(Duration::from_millis(300)).unwrap(),
        );

        let started = Instant::now();
        let lookups = (0..8).map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_key(TEST_KID).await })
        });
        for handle in lookups.collect::<Vec<_>>() {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(AuthError::KeySetUnavailable(_))));
        }
        assert!(started.elapsed() < Duration::from_millis(900));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_backs_off_then_retries() {
        let server = spawn_jwks_server(test_jwks()).await;
        server.set_status(500);
        let manager = manager(&server.url).with_min_refresh_interval(Duration::from_millis(200));

        for _ in 0..5 {
            assert!(manager.ensure_fresh().await.is_err());
        }
        assert_eq!(server.hits(), 1);

        server.set_status(200);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(manager.get_key(TEST_KID).await.unwrap().is_some());
        assert_eq!(server.hits(), 2);
    }

    #[tokio::test]
    async fn ensure_fresh_uses_cached_keys() {
        let server = spawn_jwks_server(test_jwks()).await;
        let manager = manager(&server.url);

        manager.ensure_fresh().await.unwrap();
        manager.ensure_fresh().await.unwrap();
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let server = spawn_jwks_server(test_jwks()).await;
        let manager = manager(&server.url);

        let lookups = (0..8).map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.get_key(TEST_KID).await })
        });
        for handle in lookups.collect::<Vec<_>>() {
            assert!(handle.await.unwrap().unwrap().is_some());
        }
        assert_eq!(server.hits(), 1);
    }
}
