// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership checks for per-user resources.
//!
//! Repositories consult this before returning or mutating a record, and
//! report a foreign record as not found.

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's local user ID.
    fn owner_user_id(&self) -> &str;

    /// Whether `user_id` owns this resource.
    fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_user_id() == user_id
    }
}
