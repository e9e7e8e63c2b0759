// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are keyed by username, which is the verified token subject. The key
//! itself is the uniqueness constraint: a second insert for the same username
//! inside a write transaction is reported as `AlreadyExists`.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};

use super::super::database::{StorageError, StorageResult, TodoDatabase, USERS};

/// Local user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Opaque local identifier (UUID)
    pub id: String,
    /// Unique username, equal to the token subject
    pub username: String,
    /// When the user was first seen
    pub created_at: DateTime<Utc>,
}

/// Repository for user records.
pub struct UserRepository<'a> {
    database: &'a TodoDatabase,
}

impl<'a> UserRepository<'a> {
    pub fn new(database: &'a TodoDatabase) -> Self {
        Self { database }
    }

    /// Look up a user by username.
    pub fn get_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.database.db().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(username)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Create a user with only its username populated.
    ///
    /// Fails with `AlreadyExists` if the username is taken, including when a
    /// concurrent request created it first.
    pub fn create(&self, username: &str) -> StorageResult<StoredUser> {
        let user = StoredUser {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&user)?;

        let write_txn = self.database.db().begin_write()?;
        let taken = {
            let mut table = write_txn.open_table(USERS)?;
            let taken = table.get(username)?.is_some();
            if !taken {
                table.insert(username, json.as_slice())?;
            }
            taken
        };

        if taken {
            write_txn.abort()?;
            return Err(StorageError::AlreadyExists(format!("User {username}")));
        }
        write_txn.commit()?;
        Ok(user)
    }

    /// Number of stored users.
    pub fn count(&self) -> StorageResult<u64> {
        let read_txn = self.database.db().begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.len()?)
    }
}
