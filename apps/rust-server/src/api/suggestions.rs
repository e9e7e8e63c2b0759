// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{auth::Auth, error::ApiError, models::SuggestionsResponse, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SuggestionQuery {
    /// Text typed so far. Missing or blank yields no suggestions.
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/youtube/search",
    params(SuggestionQuery),
    tag = "Suggestions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Suggestions for the query", body = SuggestionsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Suggestion service unavailable")
    )
)]
pub async fn search_suggestions(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Query(params): Query<SuggestionQuery>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let suggestions = state.suggestions.suggest(&params.q).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
