// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Todo endpoints. Every operation is scoped to the caller; another user's
//! todo answers 404.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{Auth, AuthenticatedUser},
    error::ApiError,
    models::{CreateTodoRequest, PatchTodoRequest, Todo, TodoType, UpdateTodoRequest},
    state::AppState,
    storage::{StorageError, StoredTodo, TodoDatabase},
};

fn render(db: &TodoDatabase, user: &AuthenticatedUser, todo: StoredTodo) -> Result<Todo, ApiError> {
    let todo_type = match todo.todo_type_id {
        Some(type_id) => match db.todo_types().get(type_id) {
            Ok(stored) => Some(TodoType::from(stored)),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
        None => None,
    };
    Ok(Todo::from_stored(todo, &user.username, todo_type))
}

#[utoipa::path(
    get,
    path = "/api/todos",
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's todos, newest first", body = [Todo]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_todos(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let db = &state.database;
    let types: HashMap<u64, TodoType> = db
        .todo_types()
        .list()?
        .into_iter()
        .map(|t| (t.id, TodoType::from(t)))
        .collect();

    let todos = db
        .todos()
        .list_by_owner(&user.user_id)?
        .into_iter()
        .map(|todo| {
            let todo_type = todo.todo_type_id.and_then(|id| types.get(&id).cloned());
            Todo::from_stored(todo, &user.username, todo_type)
        })
        .collect();
    Ok(Json(todos))
}

#[utoipa::path(
    post,
    path = "/api/todos",
    request_body = CreateTodoRequest,
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Invalid title or todo_type_id"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_todo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    request.validate().map_err(ApiError::bad_request)?;

    let todo = state.database.todos().create(&user.user_id, request.into())?;
    tracing::debug!(todo_id = todo.id, username = %user.username, "Created todo");
    Ok((StatusCode::CREATED, Json(render(&state.database, &user, todo)?)))
}

#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    params(("id" = u64, Path, description = "Todo ID")),
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Todo", body = Todo),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such todo for this user")
    )
)]
pub async fn get_todo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state.database.todos().get_owned(&user.user_id, id)?;
    Ok(Json(render(&state.database, &user, todo)?))
}

#[utoipa::path(
    put,
    path = "/api/todos/{id}",
    params(("id" = u64, Path, description = "Todo ID")),
    request_body = UpdateTodoRequest,
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Todo replaced", body = Todo),
        (status = 400, description = "Invalid title or todo_type_id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such todo for this user")
    )
)]
pub async fn update_todo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    request.validate().map_err(ApiError::bad_request)?;

    let todo = state
        .database
        .todos()
        .update(&user.user_id, id, request.into())?;
    Ok(Json(render(&state.database, &user, todo)?))
}

#[utoipa::path(
    patch,
    path = "/api/todos/{id}",
    params(("id" = u64, Path, description = "Todo ID")),
    request_body = PatchTodoRequest,
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, description = "Invalid title or todo_type_id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such todo for this user")
    )
)]
pub async fn patch_todo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<PatchTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    request.validate().map_err(ApiError::bad_request)?;

    let todo = state
        .database
        .todos()
        .update(&user.user_id, id, request.into())?;
    Ok(Json(render(&state.database, &user, todo)?))
}

#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    params(("id" = u64, Path, description = "Todo ID")),
    tag = "Todos",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such todo for this user")
    )
)]
pub async fn delete_todo(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.database.todos().delete(&user.user_id, id)?;
    tracing::debug!(todo_id = id, username = %user.username, "Deleted todo");
    Ok(StatusCode::NO_CONTENT)
}
