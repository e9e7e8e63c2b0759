// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Todo Types**: Shared, read-only task categories
//! - **Todos**: Personal task items, visible only to their owner
//! - **Suggestions**: Search-suggestion proxy responses
//! - **Users**: The authenticated caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::storage::{NewTodo, StoredTodo, StoredTodoType, TodoChanges};

/// Maximum todo title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum todo type name length, in characters.
pub const MAX_TODO_TYPE_NAME_LEN: usize = 50;

// =============================================================================
// Todo Type Models
// =============================================================================

/// A shared task category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TodoType {
    pub id: u64,
    pub name: String,
    pub description: String,
}

impl From<StoredTodoType> for TodoType {
    fn from(stored: StoredTodoType) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            description: stored.description,
        }
    }
}

// =============================================================================
// Todo Models
// =============================================================================

/// A task item as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Username of the owner.
    pub owner: String,
    /// Category, or null when uncategorized.
    pub todo_type: Option<TodoType>,
}

impl Todo {
    pub fn from_stored(todo: StoredTodo, owner: &str, todo_type: Option<TodoType>) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            owner: owner.to_string(),
            todo_type,
        }
    }
}

/// Request to create a todo.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    /// Required, at most 200 characters.
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub todo_type_id: Option<u64>,
}

impl CreateTodoRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

impl From<CreateTodoRequest> for NewTodo {
    fn from(request: CreateTodoRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            description: request.description,
            completed: request.completed,
            todo_type_id: request.todo_type_id,
        }
    }
}

/// Request to replace every writable field of a todo (PUT).
///
/// Omitted optional fields are reset to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub todo_type_id: Option<u64>,
}

impl UpdateTodoRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

impl From<UpdateTodoRequest> for TodoChanges {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            title: Some(request.title.trim().to_string()),
            description: Some(request.description),
            completed: Some(request.completed),
            todo_type_id: Some(request.todo_type_id),
        }
    }
}

/// Request to change some fields of a todo (PATCH).
///
/// An absent `todo_type_id` leaves the category alone; `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PatchTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u64>)]
    pub todo_type_id: Option<Option<u64>>,
}

impl PatchTodoRequest {
    pub fn validate(&self) -> Result<(), String> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

impl From<PatchTodoRequest> for TodoChanges {
    fn from(request: PatchTodoRequest) -> Self {
        Self {
            title: request.title.map(|t| t.trim().to_string()),
            description: request.description,
            completed: request.completed,
            todo_type_id: request.todo_type_id,
        }
    }
}

/// Present-but-null becomes `Some(None)`; absence is handled by `default`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("title: This field may not be blank.".to_string());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "title: Ensure this field has no more than {MAX_TITLE_LEN} characters."
        ));
    }
    Ok(())
}

/// Validate a todo type name before it is stored.
pub fn validate_todo_type_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("name: This field may not be blank.".to_string());
    }
    if name.chars().count() > MAX_TODO_TYPE_NAME_LEN {
        return Err(format!(
            "name: Ensure this field has no more than {MAX_TODO_TYPE_NAME_LEN} characters."
        ));
    }
    Ok(())
}

// =============================================================================
// Suggestion Models
// =============================================================================

/// Search suggestions for a query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

// =============================================================================
// User Models
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    /// Local user ID
    pub id: String,
    /// Username (token subject)
    pub username: String,
}
