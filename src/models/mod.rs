// src/models/mod.rs

//! Data models for the directory client.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod domain;
mod session;
mod user;

// Re-export all public types
pub use config::{ApiConfig, Config, ConnectionsConfig, DiscoveryConfig, LoggingConfig};
pub use domain::{Domain, DomainSnapshot, StoryPage, StoryRecord, UserStory};
pub use session::{AccessToken, SavedSession};
pub use user::{Connection, User, UserRecord, UsersResponse};

/// Result of a domain discovery request.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOutcome {
    /// Domains to display, last location first when present
    pub domains: Vec<Domain>,

    /// Whether a network pass produced this result
    pub fetched: bool,
}

impl DiscoveryOutcome {
    /// Whether the list should show a "no results" message.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
