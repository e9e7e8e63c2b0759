// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential extraction from request headers.
//!
//! The `Authorization` header wins when present, even if it is malformed;
//! the `access_token` cookie is consulted only when the header is absent.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

/// Cookie carrying the token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// What the request presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Neither header nor cookie
    Missing,
    /// Header present but unusable
    Malformed(&'static str),
    /// Token to verify
    Bearer(String),
}

impl Credential {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(value) = headers.get(AUTHORIZATION) {
            let Ok(value) = value.to_str() else {
                return Credential::Malformed("header is not visible ASCII");
            };
            return parse_authorization(value);
        }

        match CookieJar::from_headers(headers).get(ACCESS_TOKEN_COOKIE) {
            Some(cookie) if !cookie.value().is_empty() => {
                Credential::Bearer(cookie.value().to_string())
            }
            _ => Credential::Missing,
        }
    }
}

fn parse_authorization(value: &str) -> Credential {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [] => Credential::Malformed("no credentials provided"),
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => {
            Credential::Bearer((*token).to_string())
        }
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => {
            Credential::Malformed("unsupported authorization scheme")
        }
        [_] => Credential::Malformed("no credentials provided"),
        _ => Credential::Malformed("credentials string should not contain spaces"),
    }
}
