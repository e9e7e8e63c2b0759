// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8000` |
//! | `DATABASE_PATH` | redb database file | `data/todo.redb` |
//! | `AUTH_ISSUER_DOMAIN` | Token issuer domain (issuer URL and JWKS host) | Required |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Required |
//! | `AUTH_JWKS_URL` | Override for the JWKS endpoint | `https://{domain}/.well-known/jwks.json` |
//! | `JWKS_CACHE_TTL_SECS` | Key set cache lifetime | `300` |
//! | `JWKS_TIMEOUT_SECS` | Key set fetch timeout | `10` |
//! | `SUGGEST_BASE_URL` | Upstream autocomplete endpoint | `https://suggestqueries.google.com/complete/search` |
//! | `SUGGEST_TIMEOUT_SECS` | Upstream autocomplete timeout | `5` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated allowed origins | Permissive |
//! | `SEED_TODO_TYPES` | Comma-separated `name[:description]` entries | None |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files enabling HTTPS | Plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const AUTH_ISSUER_DOMAIN_ENV: &str = "AUTH_ISSUER_DOMAIN";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const AUTH_JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_TIMEOUT_ENV: &str = "JWKS_TIMEOUT_SECS";
pub const SUGGEST_BASE_URL_ENV: &str = "SUGGEST_BASE_URL";
pub const SUGGEST_TIMEOUT_ENV: &str = "SUGGEST_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const SEED_TODO_TYPES_ENV: &str = "SEED_TODO_TYPES";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_PATH: &str = "data/todo.redb";
const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SUGGEST_BASE_URL: &str = "https://suggestqueries.google.com/complete/search";
const DEFAULT_SUGGEST_TIMEOUT_SECS: u64 = 5;

/// Path of the key set document relative to the issuer.
const JWKS_PATH: &str = ".well-known/jwks.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Token verification settings derived from the issuer domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Expected `iss` claim, `https://{domain}/`.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// Key set document URL.
    pub jwks_url: String,
    pub jwks_cache_ttl: Duration,
    pub jwks_timeout: Duration,
}

impl AuthSettings {
    /// Build settings from an issuer domain such as `tenant.eu.auth0.com`.
    ///
    /// Both the issuer URL and the key set URL are derived from the domain.
    pub fn from_domain(domain: &str, audience: &str) -> Result<Self, ConfigError> {
        let domain = domain.trim().trim_end_matches('/');
        if domain.is_empty() || domain.contains("://") {
            return Err(ConfigError::Invalid {
                name: AUTH_ISSUER_DOMAIN_ENV,
                reason: "expected a bare domain such as `tenant.example.com`".to_string(),
            });
        }

        let issuer = Url::parse(&format!("https://{domain}/")).map_err(|e| ConfigError::Invalid {
            name: AUTH_ISSUER_DOMAIN_ENV,
            reason: e.to_string(),
        })?;
        let jwks_url = issuer.join(JWKS_PATH).map_err(|e| ConfigError::Invalid {
            name: AUTH_ISSUER_DOMAIN_ENV,
            reason: e.to_string(),
        })?;

        let audience = audience.trim();
        if audience.is_empty() {
            return Err(ConfigError::Missing(AUTH_AUDIENCE_ENV));
        }

        Ok(Self {
            issuer: format!("https://{domain}/"),
            audience: audience.to_string(),
            jwks_url: jwks_url.to_string(),
            jwks_cache_ttl: Duration::from_secs(DEFAULT_JWKS_CACHE_TTL_SECS),
            jwks_timeout: Duration::from_secs(DEFAULT_JWKS_TIMEOUT_SECS),
        })
    }

    /// Point key set fetching at a different URL (issuer stays unchanged).
    pub fn with_jwks_url(mut self, jwks_url: impl Into<String>) -> Self {
        self.jwks_url = jwks_url.into();
        self
    }
}

/// Upstream autocomplete settings.
#[derive(Debug, Clone)]
pub struct SuggestSettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SuggestSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SUGGEST_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_SUGGEST_TIMEOUT_SECS),
        }
    }
}

/// A task type to create at startup if missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTodoType {
    pub name: String,
    pub description: String,
}

/// Parse `SEED_TODO_TYPES` entries: `work:Office tasks,home,errands:Out and about`.
pub fn parse_seed_todo_types(raw: &str) -> Vec<SeedTodoType> {
    raw.split(',')
        .filter_map(|entry| {
            let (name, description) = match entry.split_once(':') {
                Some((name, description)) => (name.trim(), description.trim()),
                None => (entry.trim(), ""),
            };
            (!name.is_empty()).then(|| SeedTodoType {
                name: name.to_string(),
                description: description.to_string(),
            })
        })
        .collect()
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub auth: AuthSettings,
    pub suggest: SuggestSettings,
    pub cors_allowed_origins: Vec<String>,
    pub seed_todo_types: Vec<SeedTodoType>,
    pub tls: Option<(PathBuf, PathBuf)>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or(HOST_ENV, DEFAULT_HOST);
        let port = match optional_env(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let domain =
            optional_env(AUTH_ISSUER_DOMAIN_ENV).ok_or(ConfigError::Missing(AUTH_ISSUER_DOMAIN_ENV))?;
        let audience =
            optional_env(AUTH_AUDIENCE_ENV).ok_or(ConfigError::Missing(AUTH_AUDIENCE_ENV))?;
        let mut auth = AuthSettings::from_domain(&domain, &audience)?;
        if let Some(jwks_url) = optional_env(AUTH_JWKS_URL_ENV) {
            auth = auth.with_jwks_url(jwks_url);
        }
        auth.jwks_cache_ttl = secs_env(JWKS_CACHE_TTL_ENV, DEFAULT_JWKS_CACHE_TTL_SECS)?;
        auth.jwks_timeout = secs_env(JWKS_TIMEOUT_ENV, DEFAULT_JWKS_TIMEOUT_SECS)?;

        let mut suggest = SuggestSettings::default();
        if let Some(raw) = optional_env(SUGGEST_BASE_URL_ENV) {
            Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                name: SUGGEST_BASE_URL_ENV,
                reason: e.to_string(),
            })?;
            suggest.base_url = raw;
        }
        suggest.timeout = secs_env(SUGGEST_TIMEOUT_ENV, DEFAULT_SUGGEST_TIMEOUT_SECS)?;

        let cors_allowed_origins = optional_env(CORS_ALLOWED_ORIGINS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let seed_todo_types = optional_env(SEED_TODO_TYPES_ENV)
            .map(|raw| parse_seed_todo_types(&raw))
            .unwrap_or_default();

        let tls = match (optional_env(TLS_CERT_PATH_ENV), optional_env(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            bind_addr,
            database_path: PathBuf::from(env_or(DATABASE_PATH_ENV, DEFAULT_DATABASE_PATH)),
            auth,
            suggest,
            cors_allowed_origins,
            seed_todo_types,
            tls,
        })
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

fn secs_env(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match optional_env(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        None => Ok(Duration::from_secs(default)),
    }
}
