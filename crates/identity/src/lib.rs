// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! LaunchKit Identity Module
//!
//! Admin-side client for the hosted identity provider (Supabase GoTrue).
//! The billing reconciler reads and writes the `user_metadata` sub-object
//! on user records through this crate; it never owns user records itself.
//!
//! ## Features
//!
//! - **Typed metadata**: explicit struct for the subscription fields this
//!   system owns, with an open extension map for everything else
//! - **Directory seam**: `UserDirectory` trait over the provider's admin
//!   API, so callers can be tested against an in-memory implementation
//! - **Email lookup**: paginated scan over all users (the provider has no
//!   lookup-by-email index)

pub mod directory;
pub mod error;
pub mod lookup;
pub mod metadata;
pub mod password;
pub mod supabase;

pub use directory::{DirectoryUser, NewUser, UserDirectory};
pub use error::{IdentityError, IdentityResult};
pub use lookup::{find_user_by_email, LOOKUP_PAGE_SIZE};
pub use metadata::UserMetadata;
pub use password::generate_password;
pub use supabase::{SupabaseAdminClient, SupabaseConfig};
