// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task type repository.
//!
//! Task types are shared across all users. Names are unique through the
//! `todo_type_names` index. Deleting a type clears the reference on every
//! todo that points at it; the todos themselves are kept.

use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::super::database::{
    next_id, StorageError, StorageResult, TodoDatabase, TODOS, TODO_TYPES, TODO_TYPE_NAMES,
};
use super::todos::StoredTodo;

const SEQUENCE: &str = "todo_types";

/// Shared task category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTodoType {
    pub id: u64,
    pub name: String,
    pub description: String,
}

/// Repository for task type operations.
pub struct TodoTypeRepository<'a> {
    database: &'a TodoDatabase,
}

impl<'a> TodoTypeRepository<'a> {
    pub fn new(database: &'a TodoDatabase) -> Self {
        Self { database }
    }

    /// Get a task type by ID.
    pub fn get(&self, id: u64) -> StorageResult<StoredTodoType> {
        let read_txn = self.database.db().begin_read()?;
        let table = read_txn.open_table(TODO_TYPES)?;
        match table.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StorageError::NotFound(format!("Todo type {id}"))),
        }
    }

    /// Get a task type by its unique name.
    pub fn get_by_name(&self, name: &str) -> StorageResult<Option<StoredTodoType>> {
        let read_txn = self.database.db().begin_read()?;
        let names = read_txn.open_table(TODO_TYPE_NAMES)?;
        let Some(id) = names.get(name)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let table = read_txn.open_table(TODO_TYPES)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// List all task types ordered by name.
    pub fn list(&self) -> StorageResult<Vec<StoredTodoType>> {
        let read_txn = self.database.db().begin_read()?;
        let names = read_txn.open_table(TODO_TYPE_NAMES)?;
        let table = read_txn.open_table(TODO_TYPES)?;

        let mut types = Vec::new();
        for entry in names.iter()? {
            let (_, id) = entry?;
            if let Some(value) = table.get(id.value())? {
                types.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(types)
    }

    /// Create a task type. Names are unique.
    pub fn create(&self, name: &str, description: &str) -> StorageResult<StoredTodoType> {
        let write_txn = self.database.db().begin_write()?;
        let taken = {
            let names = write_txn.open_table(TODO_TYPE_NAMES)?;
            let taken = names.get(name)?.is_some();
            taken
        };
        if taken {
            write_txn.abort()?;
            return Err(StorageError::AlreadyExists(format!("Todo type {name}")));
        }

        let todo_type = StoredTodoType {
            id: next_id(&write_txn, SEQUENCE)?,
            name: name.to_string(),
            description: description.to_string(),
        };
        let json = serde_json::to_vec(&todo_type)?;
        {
            let mut names = write_txn.open_table(TODO_TYPE_NAMES)?;
            names.insert(name, todo_type.id)?;
            let mut table = write_txn.open_table(TODO_TYPES)?;
            table.insert(todo_type.id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(todo_type)
    }

    /// Return the task type with this name, creating it if missing.
    pub fn ensure(&self, name: &str, description: &str) -> StorageResult<StoredTodoType> {
        if let Some(existing) = self.get_by_name(name)? {
            return Ok(existing);
        }
        match self.create(name, description) {
            Err(StorageError::AlreadyExists(_)) => self
                .get_by_name(name)?
                .ok_or_else(|| StorageError::NotFound(format!("Todo type {name}"))),
            other => other,
        }
    }

    /// Delete a task type and clear it from every todo that references it.
    ///
    /// Returns the number of todos whose reference was cleared.
    pub fn delete(&self, id: u64) -> StorageResult<usize> {
        let write_txn = self.database.db().begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TODO_TYPES)?;
            let removed = table.remove(id)?.map(|v| v.value().to_vec());
            removed
        };
        let Some(removed) = removed else {
            write_txn.abort()?;
            return Err(StorageError::NotFound(format!("Todo type {id}")));
        };
        let todo_type: StoredTodoType = serde_json::from_slice(&removed)?;

        let cleared = {
            let mut names = write_txn.open_table(TODO_TYPE_NAMES)?;
            names.remove(todo_type.name.as_str())?;

            let mut todos = write_txn.open_table(TODOS)?;
            let mut referencing = Vec::new();
            for entry in todos.iter()? {
                let (_, value) = entry?;
                let todo: StoredTodo = serde_json::from_slice(value.value())?;
                if todo.todo_type_id == Some(id) {
                    referencing.push(todo);
                }
            }

            for mut todo in referencing.iter().cloned() {
                todo.todo_type_id = None;
                let json = serde_json::to_vec(&todo)?;
                todos.insert(todo.id, json.as_slice())?;
            }
            referencing.len()
        };
        write_txn.commit()?;

        tracing::info!(todo_type_id = id, cleared, "Deleted todo type");
        Ok(cleared)
    }
}
