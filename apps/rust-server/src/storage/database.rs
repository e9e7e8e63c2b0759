// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded todo database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: username → serialized StoredUser
//! - `todo_types`: type id → serialized StoredTodoType
//! - `todo_type_names`: type name → type id (uniqueness index)
//! - `todos`: todo id → serialized StoredTodo
//! - `owner_todo_index`: composite key (owner|!created|!id) → todo id
//! - `sequences`: sequence name → last issued id
//!
//! redb serializes write transactions, so every check-then-write below runs
//! inside a single write transaction and cannot interleave with another.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::repository::{TodoRepository, TodoTypeRepository, UserRepository};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

pub(crate) const TODO_TYPES: TableDefinition<u64, &[u8]> = TableDefinition::new("todo_types");

pub(crate) const TODO_TYPE_NAMES: TableDefinition<&str, u64> =
    TableDefinition::new("todo_type_names");

pub(crate) const TODOS: TableDefinition<u64, &[u8]> = TableDefinition::new("todos");

/// Key format: `owner_id|!created_micros_be|!todo_id_be` for newest-first scans.
pub(crate) const OWNER_TODO_INDEX: TableDefinition<&[u8], u64> =
    TableDefinition::new("owner_todo_index");

pub(crate) const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0}")]
    Invalid(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the owner_todo_index table.
///
/// Both the timestamp and the id are inverted so a forward scan yields the
/// newest todo first.
pub(crate) fn make_owner_index_key(owner_id: &str, created_micros: i64, todo_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(owner_id.len() + 1 + 8 + 8);
    key.extend_from_slice(owner_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!created_micros as u64).to_be_bytes());
    key.extend_from_slice(&(!todo_id).to_be_bytes());
    key
}

/// Prefix covering every index entry of one owner.
pub(crate) fn make_owner_prefix(owner_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner_id.len() + 1);
    prefix.extend_from_slice(owner_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for an owner range scan.
pub(crate) fn make_owner_prefix_end(owner_id: &str) -> Vec<u8> {
    let mut end = make_owner_prefix(owner_id);
    end.extend_from_slice(&[0xFF; 17]);
    end
}

/// Issue the next id of a named sequence inside an open write transaction.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

// =============================================================================
// TodoDatabase
// =============================================================================

/// Embedded ACID store for users, task types, and tasks.
pub struct TodoDatabase {
    db: Database,
}

impl TodoDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(TODO_TYPES)?;
            let _ = write_txn.open_table(TODO_TYPE_NAMES)?;
            let _ = write_txn.open_table(TODOS)?;
            let _ = write_txn.open_table(OWNER_TODO_INDEX)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn todo_types(&self) -> TodoTypeRepository<'_> {
        TodoTypeRepository::new(self)
    }

    pub fn todos(&self) -> TodoRepository<'_> {
        TodoRepository::new(self)
    }

    /// Cheap readiness probe: open a read transaction and touch a table.
    pub fn check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCES)?;
        let _ = table.get("todos")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todo.redb");
        let db = TodoDatabase::open(&path).unwrap();
        assert!(path.exists());
        db.check().unwrap();
    }

    #[test]
    fn sequences_are_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let db = TodoDatabase::open(&dir.path().join("seq.redb")).unwrap();

        let txn = db.db().begin_write().unwrap();
        assert_eq!(next_id(&txn, "todos").unwrap(), 1);
        assert_eq!(next_id(&txn, "todos").unwrap(), 2);
        assert_eq!(next_id(&txn, "todo_types").unwrap(), 1);
        txn.commit().unwrap();

        let txn = db.db().begin_write().unwrap();
        assert_eq!(next_id(&txn, "todos").unwrap(), 3);
        txn.commit().unwrap();
    }

    #[test]
    fn owner_index_orders_newest_first() {
        let older = make_owner_index_key("user-1", 1_000, 1);
        let newer = make_owner_index_key("user-1", 2_000, 2);
        assert!(newer < older, "newer timestamps should sort first");

        let same_time_low_id = make_owner_index_key("user-1", 1_000, 3);
        let same_time_high_id = make_owner_index_key("user-1", 1_000, 4);
        assert!(same_time_high_id < same_time_low_id);
    }

    #[test]
    fn owner_prefix_bounds_contain_only_that_owner() {
        let key = make_owner_index_key("user-1", 1_000, 1);
        let other = make_owner_index_key("user-10", 1_000, 1);
        let start = make_owner_prefix("user-1");
        let end = make_owner_prefix_end("user-1");

        assert!(key.as_slice() >= start.as_slice() && key.as_slice() < end.as_slice());
        assert!(!(other.as_slice() >= start.as_slice() && other.as_slice() < end.as_slice()));
    }
}
