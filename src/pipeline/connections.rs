// src/pipeline/connections.rs

//! People list with optimistic friend toggling.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Connection, User};
use crate::services::UsersProvider;

/// A row of the people list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub user: User,

    /// A friend change for this row is waiting on the server
    pub pending: bool,
}

/// Token returned by `begin_toggle`, needed to settle the toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub username: String,
    pub previous: Connection,
}

/// The people list model.
pub struct ConnectionsList {
    provider: Arc<dyn UsersProvider>,
    entries: Vec<ConnectionEntry>,
}

impl ConnectionsList {
    pub fn new(provider: Arc<dyn UsersProvider>) -> Self {
        Self {
            provider,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[ConnectionEntry] {
        &self.entries
    }

    pub fn get(&self, username: &str) -> Option<&ConnectionEntry> {
        self.entries.iter().find(|e| e.user.name == username)
    }

    /// Reload the list from the provider, replacing current rows.
    pub async fn refresh(&mut self) -> Result<&[ConnectionEntry]> {
        let users = self.provider.retrieve().await?;
        self.entries = users
            .into_iter()
            .map(|user| ConnectionEntry {
                user,
                pending: false,
            })
            .collect();
        Ok(&self.entries)
    }

    /// Flip the star immediately and mark the row pending.
    pub fn begin_toggle(&mut self, username: &str) -> Result<PendingToggle> {
        let entry = self.entry_mut(username)?;
        if entry.pending {
            return Err(AppError::InFlight(username.to_string()));
        }

        let previous = entry.user.connection;
        entry.user.connection = match previous {
            Connection::Friend => Connection::Connection,
            Connection::Connection => Connection::Friend,
        };
        entry.pending = true;

        Ok(PendingToggle {
            username: username.to_string(),
            previous,
        })
    }

    /// Keep the flipped state on success, restore it on failure.
    ///
    /// The row is clickable again either way.
    pub fn finish_toggle(&mut self, toggle: PendingToggle, result: &Result<()>) {
        let Ok(entry) = self.entry_mut(&toggle.username) else {
            return;
        };
        entry.pending = false;
        if result.is_err() {
            entry.user.connection = toggle.previous;
        }
    }

    /// Toggle the friend star for `username` through the provider.
    ///
    /// Returns whether the user is a friend afterwards.
    pub async fn toggle_friend(&mut self, username: &str) -> Result<bool> {
        let toggle = self.begin_toggle(username)?;
        let result = match toggle.previous {
            Connection::Friend => self.provider.remove_friend(username).await,
            Connection::Connection => self.provider.add_friend(username).await,
        };

        self.finish_toggle(toggle, &result);
        result?;
        Ok(self
            .get(username)
            .is_some_and(|e| e.user.connection.is_friend()))
    }

    /// Remove a connection once the server confirms it.
    pub async fn remove_connection(&mut self, username: &str) -> Result<()> {
        self.entry_mut(username)?;
        self.provider.remove_connection(username).await?;
        self.entries.retain(|e| e.user.name != username);
        Ok(())
    }

    fn entry_mut(&mut self, username: &str) -> Result<&mut ConnectionEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.user.name == username)
            .ok_or_else(|| AppError::validation(format!("no connection named '{username}'")))
    }
}
