// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Todo repository.
//!
//! Every todo has exactly one owner. All lookups take the owner's user id and
//! treat a todo owned by someone else exactly like a missing one.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::super::database::{
    make_owner_index_key, make_owner_prefix, make_owner_prefix_end, next_id, StorageError,
    StorageResult, TodoDatabase, OWNER_TODO_INDEX, TODOS, TODO_TYPES,
};
use super::super::ownership::OwnedResource;

const SEQUENCE: &str = "todos";

/// Todo stored in the embedded database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTodo {
    pub id: u64,
    /// Local user id of the owner
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Optional task type; cleared when the type is deleted
    pub todo_type_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredTodo {
    fn owner_user_id(&self) -> &str {
        &self.owner_id
    }
}

/// Fields of a todo to create.
#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub todo_type_id: Option<u64>,
}

/// Changes to apply to an existing todo. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the task type.
    pub todo_type_id: Option<Option<u64>>,
}

/// Repository for todo operations.
pub struct TodoRepository<'a> {
    database: &'a TodoDatabase,
}

impl<'a> TodoRepository<'a> {
    pub fn new(database: &'a TodoDatabase) -> Self {
        Self { database }
    }

    /// Create a todo owned by `owner_id`.
    pub fn create(&self, owner_id: &str, new: NewTodo) -> StorageResult<StoredTodo> {
        let write_txn = self.database.db().begin_write()?;
        if let Some(type_id) = new.todo_type_id {
            if !type_exists(&write_txn, type_id)? {
                write_txn.abort()?;
                return Err(invalid_type(type_id));
            }
        }

        let now = Utc::now();
        let todo = StoredTodo {
            id: next_id(&write_txn, SEQUENCE)?,
            owner_id: owner_id.to_string(),
            title: new.title,
            description: new.description,
            completed: new.completed,
            todo_type_id: new.todo_type_id,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_vec(&todo)?;
        {
            let mut table = write_txn.open_table(TODOS)?;
            table.insert(todo.id, json.as_slice())?;

            let mut index = write_txn.open_table(OWNER_TODO_INDEX)?;
            let key = index_key(&todo);
            index.insert(key.as_slice(), todo.id)?;
        }
        write_txn.commit()?;
        Ok(todo)
    }

    /// Get a todo if it exists and belongs to `owner_id`.
    pub fn get_owned(&self, owner_id: &str, id: u64) -> StorageResult<StoredTodo> {
        let read_txn = self.database.db().begin_read()?;
        let table = read_txn.open_table(TODOS)?;
        let todo: StoredTodo = match table.get(id)? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(not_found(id)),
        };

        if !todo.is_owned_by(owner_id) {
            return Err(not_found(id));
        }
        Ok(todo)
    }

    /// List the owner's todos, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> StorageResult<Vec<StoredTodo>> {
        let read_txn = self.database.db().begin_read()?;
        let index = read_txn.open_table(OWNER_TODO_INDEX)?;
        let table = read_txn.open_table(TODOS)?;

        let start = make_owner_prefix(owner_id);
        let end = make_owner_prefix_end(owner_id);

        let mut todos = Vec::new();
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, id) = entry?;
            if let Some(value) = table.get(id.value())? {
                let todo: StoredTodo = serde_json::from_slice(value.value())?;
                if todo.is_owned_by(owner_id) {
                    todos.push(todo);
                }
            }
        }
        Ok(todos)
    }

    /// Apply changes to an owned todo and bump `updated_at`.
    pub fn update(&self, owner_id: &str, id: u64, changes: TodoChanges) -> StorageResult<StoredTodo> {
        let write_txn = self.database.db().begin_write()?;
        let existing = {
            let table = write_txn.open_table(TODOS)?;
            let existing = table.get(id)?.map(|v| v.value().to_vec());
            existing
        };

        let mut todo: StoredTodo = match existing {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => {
                write_txn.abort()?;
                return Err(not_found(id));
            }
        };
        if !todo.is_owned_by(owner_id) {
            write_txn.abort()?;
            return Err(not_found(id));
        }

        if let Some(Some(type_id)) = changes.todo_type_id {
            if !type_exists(&write_txn, type_id)? {
                write_txn.abort()?;
                return Err(invalid_type(type_id));
            }
        }

        if let Some(title) = changes.title {
            todo.title = title;
        }
        if let Some(description) = changes.description {
            todo.description = description;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }
        if let Some(todo_type_id) = changes.todo_type_id {
            todo.todo_type_id = todo_type_id;
        }
        todo.updated_at = Utc::now();

        let json = serde_json::to_vec(&todo)?;
        {
            let mut table = write_txn.open_table(TODOS)?;
            table.insert(todo.id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(todo)
    }

    /// Delete an owned todo.
    pub fn delete(&self, owner_id: &str, id: u64) -> StorageResult<()> {
        let write_txn = self.database.db().begin_write()?;
        let existing = {
            let table = write_txn.open_table(TODOS)?;
            let existing = table.get(id)?.map(|v| v.value().to_vec());
            existing
        };

        let todo: StoredTodo = match existing {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => {
                write_txn.abort()?;
                return Err(not_found(id));
            }
        };
        if !todo.is_owned_by(owner_id) {
            write_txn.abort()?;
            return Err(not_found(id));
        }

        {
            let mut table = write_txn.open_table(TODOS)?;
            table.remove(id)?;
            let mut index = write_txn.open_table(OWNER_TODO_INDEX)?;
            let key = index_key(&todo);
            index.remove(key.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

fn index_key(todo: &StoredTodo) -> Vec<u8> {
    make_owner_index_key(&todo.owner_id, todo.created_at.timestamp_micros(), todo.id)
}

fn type_exists(txn: &WriteTransaction, type_id: u64) -> StorageResult<bool> {
    let table = txn.open_table(TODO_TYPES)?;
    let exists = table.get(type_id)?.is_some();
    Ok(exists)
}

fn not_found(id: u64) -> StorageError {
    StorageError::NotFound(format!("Todo {id}"))
}

fn invalid_type(type_id: u64) -> StorageError {
    StorageError::Invalid(format!(
        "Invalid todo_type_id \"{type_id}\" - object does not exist."
    ))
}
