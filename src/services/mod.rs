//! Service layer for the directory client.
//!
//! This module contains the network-facing logic for:
//! - Directory REST access (`HttpDirectoryClient`)
//! - Domain listing (`DomainProvider`)
//! - Social connections (`EndpointUsersProvider`)

pub mod api;
pub mod domains;
pub mod users;

pub use api::{AccountApi, ConnectionsApi, HttpDirectoryClient, StoriesApi, StoryQuery};
pub use domains::DomainProvider;
pub use users::{EndpointUsersProvider, UsersProvider};
