// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only task type endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{auth::Auth, error::ApiError, models::TodoType, state::AppState};

#[utoipa::path(
    get,
    path = "/api/todo-types",
    tag = "Todo Types",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All task types ordered by name", body = [TodoType]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_todo_types(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoType>>, ApiError> {
    let types = state.database.todo_types().list()?;
    Ok(Json(types.into_iter().map(TodoType::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/todo-types/{id}",
    params(("id" = u64, Path, description = "Task type ID")),
    tag = "Todo Types",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Task type", body = TodoType),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such task type")
    )
)]
pub async fn get_todo_type(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TodoType>, ApiError> {
    Ok(Json(state.database.todo_types().get(id)?.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::testutil::TestApp;
    use axum::http::StatusCode;

    fn anyone() -> Auth {
        Auth(AuthenticatedUser {
            user_id: "u-1".into(),
            username: "alice".into(),
        })
    }

    #[tokio::test]
    async fn lists_and_fetches_types() {
        let app = TestApp::spawn().await;
        let repo = app.state.database.todo_types();
        let work = repo.create("work", "Office").unwrap();
        repo.create("errands", "Out and about").unwrap();

        let Json(types) = list_todo_types(anyone(), State(app.state.clone())).await.unwrap();
        let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["errands", "work"]);

        let Json(fetched) = get_todo_type(anyone(), State(app.state.clone()), Path(work.id))
            .await
            .unwrap();
        assert_eq!(fetched.description, "Office");
    }

    #[tokio::test]
    async fn missing_type_is_not_found() {
        let app = TestApp::spawn().await;
        let err = get_todo_type(anyone(), State(app.state.clone()), Path(404))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
