//! Supabase GoTrue admin client
//!
//! Thin reqwest wrapper over the provider's admin REST API. All calls are
//! short-lived request/response; there are no long-lived connections and no
//! retries here (the billing provider's webhook redelivery is the only
//! retry mechanism in the system).

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::directory::{DirectoryUser, NewUser, UserDirectory};
use crate::error::{IdentityError, IdentityResult};
use crate::metadata::UserMetadata;

/// Connection settings for the identity provider
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`
    pub url: String,
    /// Service-role key; grants admin API access. Never logged.
    pub service_role_key: String,
}

impl SupabaseConfig {
    pub fn from_env() -> IdentityResult<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| IdentityError::Configuration("SUPABASE_URL not set".to_string()))?;
        let service_role_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY").map_err(|_| {
            IdentityError::Configuration("SUPABASE_SERVICE_ROLE_KEY not set".to_string())
        })?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_role_key,
        })
    }
}

/// Wire shape of a GoTrue user record
#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl From<SupabaseUser> for DirectoryUser {
    fn from(user: SupabaseUser) -> Self {
        DirectoryUser {
            id: user.id,
            email: user.email,
            metadata: user.user_metadata.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserPage {
    #[serde(default)]
    users: Vec<SupabaseUser>,
}

/// Admin client for the hosted identity provider
#[derive(Clone)]
pub struct SupabaseAdminClient {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseAdminClient {
    pub fn new(http: reqwest::Client, config: SupabaseConfig) -> Self {
        Self { http, config }
    }

    pub fn from_env(http: reqwest::Client) -> IdentityResult<Self> {
        Ok(Self::new(http, SupabaseConfig::from_env()?))
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/auth/v1/admin{}", self.config.url, path)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.config.url, path)
    }

    /// Turn a non-success response into an API error, preserving the body
    /// for diagnostics (provider error bodies carry no secrets).
    async fn api_error(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        IdentityError::Api { status, message }
    }

    async fn decode_user(response: reqwest::Response) -> IdentityResult<DirectoryUser> {
        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(user.into())
    }
}

#[async_trait]
impl UserDirectory for SupabaseAdminClient {
    async fn get_user_by_id(&self, id: &str) -> IdentityResult<Option<DirectoryUser>> {
        let response = self
            .http
            .get(self.admin_url(&format!("/users/{id}")))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(Self::decode_user(response).await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn list_users(&self, page: u32, per_page: u32) -> IdentityResult<Vec<DirectoryUser>> {
        let response = self
            .http
            .get(self.admin_url("/users"))
            .query(&[("page", page), ("per_page", per_page)])
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let page: UserPage = response
            .json()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        Ok(page.users.into_iter().map(DirectoryUser::from).collect())
    }

    async fn update_user_metadata(
        &self,
        id: &str,
        metadata: &UserMetadata,
    ) -> IdentityResult<()> {
        let response = self
            .http
            .put(self.admin_url(&format!("/users/{id}")))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .json(&json!({ "user_metadata": metadata }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> IdentityResult<DirectoryUser> {
        let response = self
            .http
            .post(self.admin_url("/users"))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .json(&json!({
                "email": new_user.email,
                "password": new_user.password,
                "email_confirm": new_user.email_confirmed,
                "user_metadata": new_user.metadata,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Self::decode_user(response).await
    }

    async fn invite_by_email(&self, email: &str) -> IdentityResult<()> {
        let response = self
            .http
            .post(self.auth_url("/invite"))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }

    async fn get_user_by_token(&self, token: &str) -> IdentityResult<Option<DirectoryUser>> {
        let response = self
            .http
            .get(self.auth_url("/user"))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(Self::decode_user(response).await?)),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn delete_user(&self, id: &str) -> IdentityResult<()> {
        let response = self
            .http
            .delete(self.admin_url(&format!("/users/{id}")))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(())
    }
}
