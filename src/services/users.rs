// src/services/users.rs

//! Social connections provider.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ConnectionsConfig, User};
use crate::services::api::ConnectionsApi;

/// Source of the people list and its friend actions.
#[async_trait]
pub trait UsersProvider: Send + Sync {
    /// Fetch all connections, online users first.
    async fn retrieve(&self) -> Result<Vec<User>>;

    async fn add_friend(&self, username: &str) -> Result<()>;

    async fn remove_friend(&self, username: &str) -> Result<()>;

    async fn remove_connection(&self, username: &str) -> Result<()>;
}

/// Provider backed by the directory's users endpoints.
pub struct EndpointUsersProvider {
    api: Arc<dyn ConnectionsApi>,
    access_token: String,
    per_page: u32,
}

impl EndpointUsersProvider {
    /// Create a provider authorized with the given access token.
    pub fn new(
        api: Arc<dyn ConnectionsApi>,
        access_token: impl Into<String>,
        config: &ConnectionsConfig,
    ) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AppError::auth("no access token; log in first"));
        }
        Ok(Self {
            api,
            access_token,
            per_page: config.per_page,
        })
    }

    fn report<T>(action: &str, username: &str, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            log::warn!("Failed to {} '{}': {}", action, username, error);
        }
        result
    }
}

#[async_trait]
impl UsersProvider for EndpointUsersProvider {
    async fn retrieve(&self) -> Result<Vec<User>> {
        let records = self
            .api
            .connections(&self.access_token, self.per_page)
            .await
            .inspect_err(|e| log::warn!("Failed to fetch connections: {}", e))?;

        let mut users: Vec<User> = records.into_iter().map(User::from).collect();
        users.sort_by(User::display_order);
        log::debug!("Fetched {} connections", users.len());
        Ok(users)
    }

    async fn add_friend(&self, username: &str) -> Result<()> {
        let result = self.api.add_friend(&self.access_token, username).await;
        Self::report("add friend", username, result)
    }

    async fn remove_friend(&self, username: &str) -> Result<()> {
        let result = self.api.remove_friend(&self.access_token, username).await;
        Self::report("remove friend", username, result)
    }

    async fn remove_connection(&self, username: &str) -> Result<()> {
        let result = self.api.remove_connection(&self.access_token, username).await;
        Self::report("remove connection", username, result)
    }
}
