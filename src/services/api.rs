// src/services/api.rs

//! Directory service REST client.
//!
//! The traits are the seams the providers and the session depend on;
//! `HttpDirectoryClient` implements all of them over `reqwest`.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::{AccessToken, ApiConfig, StoryPage, UserRecord, UsersResponse};
use crate::utils::http::{self, create_client, ensure_api_success, read_json};
use crate::utils::url::endpoint;

const USER_STORIES_PATH: &str = "api/v1/user_stories";
const USERS_PATH: &str = "api/v1/users";
const FRIENDS_PATH: &str = "api/v1/user/friends";
const CONNECTIONS_PATH: &str = "api/v1/user/connections";
const TOKEN_PATH: &str = "oauth/token";

/// Query for one page of the user-stories listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryQuery {
    pub include_actions: String,
    pub restriction: String,
    pub require_online: bool,
    pub protocol: String,
    pub tags: Option<String>,
    pub page: u32,
}

impl StoryQuery {
    /// Query parameters in request order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("include_actions", self.include_actions.clone()),
            ("restriction", self.restriction.clone()),
            ("require_online", self.require_online.to_string()),
            ("protocol", self.protocol.clone()),
        ];
        if let Some(tags) = &self.tags {
            params.push(("tags", tags.clone()));
        }
        params.push(("page", self.page.to_string()));
        params
    }
}

/// Paged listing of discoverable domains.
#[async_trait]
pub trait StoriesApi: Send + Sync {
    async fn user_stories(&self, query: &StoryQuery) -> Result<StoryPage>;
}

/// Bearer-authorized social connection endpoints.
#[async_trait]
pub trait ConnectionsApi: Send + Sync {
    async fn connections(&self, token: &str, per_page: u32) -> Result<Vec<UserRecord>>;
    async fn add_friend(&self, token: &str, username: &str) -> Result<()>;
    async fn remove_friend(&self, token: &str, username: &str) -> Result<()>;
    async fn remove_connection(&self, token: &str, username: &str) -> Result<()>;
}

/// Account creation and token issuance.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn password_token(&self, username: &str, password: &str) -> Result<AccessToken>;

    async fn auth_code_token(
        &self,
        auth_code: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken>;

    async fn create_account(&self, email: &str, username: &str, password: &str) -> Result<()>;
}

/// REST client for the directory service.
#[derive(Clone)]
pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
}

/// Body of a plain `{status: ...}` response.
#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    status: String,

    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// OAuth error body.
#[derive(Debug, Deserialize)]
struct TokenError {
    #[serde(default)]
    error: String,

    #[serde(default)]
    error_description: Option<String>,
}

impl HttpDirectoryClient {
    /// Create a client for the configured service.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self::with_client(create_client(config)?, &config.base_url))
    }

    /// Wrap an existing HTTP client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn url(&self, path: &str) -> Result<url::Url> {
        endpoint(&self.base_url, path)
    }

    /// Send an authorized request that only reports success or failure.
    async fn send_action(&self, request: reqwest::RequestBuilder, context: &str) -> Result<()> {
        let envelope: StatusEnvelope = read_json(request.send().await?).await?;
        ensure_api_success(&envelope.status, context)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<AccessToken> {
        let response = self.client.post(self.url(TOKEN_PATH)?).form(form).send().await?;
        let status = response.status();

        if status.is_client_error() {
            let text = response.text().await?;
            let message = http::decode_json::<TokenError>(&text)
                .map(|e| e.error_description.unwrap_or(e.error))
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(AppError::auth(message));
        }

        let token: AccessToken = read_json(response).await?;
        if token.access_token.is_empty() {
            return Err(AppError::payload("token response without access_token"));
        }
        Ok(token)
    }
}

#[async_trait]
impl StoriesApi for HttpDirectoryClient {
    async fn user_stories(&self, query: &StoryQuery) -> Result<StoryPage> {
        let response = self
            .client
            .get(self.url(USER_STORIES_PATH)?)
            .query(&query.params())
            .send()
            .await?;

        let page: StoryPage = read_json(response).await?;
        ensure_api_success(&page.status, "user_stories")?;
        Ok(page)
    }
}

#[async_trait]
impl ConnectionsApi for HttpDirectoryClient {
    async fn connections(&self, token: &str, per_page: u32) -> Result<Vec<UserRecord>> {
        let response = self
            .client
            .get(self.url(USERS_PATH)?)
            .header(AUTHORIZATION, bearer(token))
            .query(&[
                ("filter", "connections".to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await?;

        let body: UsersResponse = read_json(response).await?;
        ensure_api_success(&body.status, "users")?;
        body.data
            .map(|d| d.users)
            .ok_or_else(|| AppError::payload("users response without data"))
    }

    async fn add_friend(&self, token: &str, username: &str) -> Result<()> {
        let request = self
            .client
            .post(self.url(FRIENDS_PATH)?)
            .header(AUTHORIZATION, bearer(token))
            .json(&json!({ "username": username }));
        self.send_action(request, "add friend").await
    }

    async fn remove_friend(&self, token: &str, username: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("{FRIENDS_PATH}/{}", path_segment(username)))?)
            .header(AUTHORIZATION, bearer(token));
        self.send_action(request, "remove friend").await
    }

    async fn remove_connection(&self, token: &str, username: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("{CONNECTIONS_PATH}/{}", path_segment(username)))?)
            .header(AUTHORIZATION, bearer(token));
        self.send_action(request, "remove connection").await
    }
}

#[async_trait]
impl AccountApi for HttpDirectoryClient {
    async fn password_token(&self, username: &str, password: &str) -> Result<AccessToken> {
        self.request_token(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", "owner"),
        ])
        .await
    }

    async fn auth_code_token(
        &self,
        auth_code: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", auth_code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
            ("scope", "owner"),
        ])
        .await
    }

    async fn create_account(&self, email: &str, username: &str, password: &str) -> Result<()> {
        let body = json!({
            "user": { "email": email, "username": username, "password": password }
        });
        let response = self
            .client
            .post(self.url(USERS_PATH)?)
            .json(&body)
            .send()
            .await?;

        // Rejected signups come back as 4xx with a `fail` envelope explaining why
        if response.status().is_client_error() {
            let text = response.text().await?;
            let message = http::decode_json::<StatusEnvelope>(&text)
                .ok()
                .and_then(|e| e.data)
                .map(|d| signup_failure_message(&d))
                .unwrap_or_else(|| "signup rejected".to_string());
            return Err(AppError::auth(message));
        }

        let envelope: StatusEnvelope = read_json(response).await?;
        ensure_api_success(&envelope.status, "signup")
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Percent-encode a username for use as a single path segment.
fn path_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Flatten `{"username": ["has already been taken"]}` into one line.
fn signup_failure_message(data: &serde_json::Value) -> String {
    match data {
        serde_json::Value::Object(fields) => fields
            .iter()
            .map(|(field, reasons)| match reasons {
                serde_json::Value::Array(items) => {
                    let reasons: Vec<_> = items.iter().filter_map(|r| r.as_str()).collect();
                    format!("{field} {}", reasons.join(", "))
                }
                other => format!("{field} {}", other.as_str().unwrap_or_default()),
            })
            .collect::<Vec<_>>()
            .join("; "),
        serde_json::Value::String(s) => s.clone(),
        _ => "signup rejected".to_string(),
    }
}
