//! User directory seam
//!
//! Abstracts the identity provider's admin API. Production uses the
//! Supabase client; tests use in-memory implementations. Every call is
//! individually atomic on the provider side; there are no cross-call
//! transactions, and metadata writes are last-write-wins.

use async_trait::async_trait;

use crate::error::IdentityResult;
use crate::metadata::UserMetadata;

/// A user record as seen through the admin API
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryUser {
    /// Opaque stable identifier assigned by the provider
    pub id: String,
    pub email: Option<String>,
    pub metadata: UserMetadata,
}

/// Parameters for creating a user record (guest checkout path)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    /// Skip the confirmation email; billing already proved the address
    pub email_confirmed: bool,
    pub metadata: UserMetadata,
}

/// Admin operations against the identity provider
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by its stable identifier. `Ok(None)` when unknown.
    async fn get_user_by_id(&self, id: &str) -> IdentityResult<Option<DirectoryUser>>;

    /// Fetch one page of users. Pages are 1-based; a page shorter than
    /// `per_page` is the last one.
    async fn list_users(&self, page: u32, per_page: u32) -> IdentityResult<Vec<DirectoryUser>>;

    /// Replace the user's whole `user_metadata` object
    async fn update_user_metadata(&self, id: &str, metadata: &UserMetadata)
        -> IdentityResult<()>;

    /// Create a user record, returning it as stored
    async fn create_user(&self, new_user: NewUser) -> IdentityResult<DirectoryUser>;

    /// Trigger the provider's invitation email
    async fn invite_by_email(&self, email: &str) -> IdentityResult<()>;

    /// Resolve the user behind an end-user access token. `Ok(None)` when
    /// the token is invalid or expired.
    async fn get_user_by_token(&self, token: &str) -> IdentityResult<Option<DirectoryUser>>;

    /// Permanently delete a user record
    async fn delete_user(&self, id: &str) -> IdentityResult<()>;
}
