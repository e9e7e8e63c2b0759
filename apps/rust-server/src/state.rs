// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::storage::TodoDatabase;
use crate::suggestions::SuggestionClient;

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<TodoDatabase>,
    pub authenticator: Arc<Authenticator>,
    pub suggestions: Arc<SuggestionClient>,
}

impl AppState {
    pub fn new(
        database: Arc<TodoDatabase>,
        authenticator: Authenticator,
        suggestions: SuggestionClient,
    ) -> Self {
        Self {
            database,
            authenticator: Arc::new(authenticator),
            suggestions: Arc::new(suggestions),
        }
    }
}
