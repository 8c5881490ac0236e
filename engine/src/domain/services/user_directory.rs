//! Authoritative in-memory user directory
//!
//! Logically part of the supervisor's locked state: the directory itself
//! does no locking and is only touched while the supervisor holds its lock.
//! Invariant: no two entries share an identity.

use crate::domain::entities::User;

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single sync request.
    ///
    /// An empty `inbound_tags` set is a delete request: the entry with the
    /// matching identity is removed, and absence is not an error. Otherwise
    /// the entry with the matching identity is replaced in place, or the
    /// user is appended if none exists.
    pub fn apply(&mut self, user: User) {
        if user.is_removal() {
            self.users.retain(|u| u.identity != user.identity);
            return;
        }

        match self
            .users
            .iter_mut()
            .find(|u| u.identity == user.identity)
        {
            Some(existing) => *existing = user,
            None => self.users.push(user),
        }
    }

    /// Full replacement of the directory.
    ///
    /// The input list is deduplicated by identity (last occurrence wins,
    /// first position kept) so the uniqueness invariant holds for any input.
    pub fn replace(&mut self, users: Vec<User>) {
        self.users.clear();
        for user in users {
            match self
                .users
                .iter_mut()
                .find(|u| u.identity == user.identity)
            {
                Some(existing) => *existing = user,
                None => self.users.push(user),
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&User> {
        self.users.iter().find(|u| u.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn to_vec(&self) -> Vec<User> {
        self.users.clone()
    }
}
