// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the todo database.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the shared redb database for all reads and writes.

pub mod todo_types;
pub mod todos;
pub mod users;

pub use todo_types::{StoredTodoType, TodoTypeRepository};
pub use todos::{NewTodo, StoredTodo, TodoChanges, TodoRepository};
pub use users::{StoredUser, UserRepository};
