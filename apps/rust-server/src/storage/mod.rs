// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Todo Storage Module
//!
//! Persistent storage for users, task types, and todos in a single embedded
//! redb database file.
//!
//! ## Guarantees
//!
//! - One user record per username (token subject)
//! - Task type names are unique
//! - A todo is only ever returned to its owner
//! - Deleting a task type clears it from todos instead of deleting them

pub mod database;
pub mod ownership;
pub mod repository;

pub use database::{StorageError, StorageResult, TodoDatabase};
pub use ownership::OwnedResource;
pub use repository::{
    NewTodo, StoredTodo, StoredTodoType, StoredUser, TodoChanges, TodoRepository,
    TodoTypeRepository, UserRepository,
};
