//! Lookup-by-email scan
//!
//! The provider's admin API has no indexed email lookup, so this is a
//! sequential paginated scan over all users: O(n) in total user count.
//! Acceptable only because billing events carry a direct user id in the
//! overwhelming majority of cases; this path exists for legacy and
//! guest-checkout flows. The scan is deliberately not parallelized: pages
//! are fetched in order so the short-page end-of-data signal stays correct.

use crate::directory::{DirectoryUser, UserDirectory};
use crate::error::IdentityResult;

/// Fixed page size for the scan
pub const LOOKUP_PAGE_SIZE: u32 = 100;

/// Scan all users for a matching email address.
///
/// Terminates when a match is found or when a page comes back shorter than
/// [`LOOKUP_PAGE_SIZE`] (end of data). Email comparison is
/// case-insensitive, as the provider normalizes addresses on signup.
pub async fn find_user_by_email(
    directory: &dyn UserDirectory,
    email: &str,
) -> IdentityResult<Option<DirectoryUser>> {
    let mut page = 1u32;
    loop {
        let users = directory.list_users(page, LOOKUP_PAGE_SIZE).await?;
        let count = users.len();

        if let Some(user) = users.into_iter().find(|u| {
            u.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        }) {
            tracing::debug!(user_id = %user.id, pages_scanned = page, "Resolved user by email scan");
            return Ok(Some(user));
        }

        if (count as u32) < LOOKUP_PAGE_SIZE {
            tracing::debug!(pages_scanned = page, "Email scan exhausted all users without a match");
            return Ok(None);
        }
        page += 1;
    }
}
