//! Typed user metadata
//!
//! The identity provider stores `user_metadata` as a free-form JSON object.
//! This system owns exactly three keys on it; everything else (display
//! names, preferences, provider-specific fields) must survive our writes
//! untouched, so unknown keys are captured in a flattened extension map and
//! written back verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// The `user_metadata` object on a user record.
///
/// Updates to the provider replace the whole object, so every write must go
/// through a fresh read-modify-write of this struct (see the reconciler).
/// `None` on the owned fields serializes as an explicit `null`, matching
/// what the provider stores for a cleared field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Identifier of the active subscription, if any
    #[serde(default)]
    pub subscription: Option<String>,

    /// Set when the subscription is flagged for end-of-period cancellation
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub subscription_cancel_at: Option<OffsetDateTime>,

    /// Set when the user asked to delete their account once the
    /// subscription runs out; cleared when a cancellation is reversed
    #[serde(default)]
    pub scheduled_account_deletion: Option<bool>,

    /// Every key this system does not own, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserMetadata {
    /// Record the subscription attached to a settled checkout or paid
    /// invoice. Cancellation fields are deliberately left alone.
    pub fn set_subscription(&mut self, subscription_id: Option<String>) {
        self.subscription = subscription_id;
    }

    /// Apply a subscription lifecycle change.
    ///
    /// `cancel_at` carries the end-of-period cancellation instant when the
    /// subscription is winding down; `None` means the subscription is (back
    /// to) fully active, which also reverses any scheduled account deletion.
    pub fn apply_cancellation(&mut self, cancel_at: Option<OffsetDateTime>) {
        match cancel_at {
            Some(at) => self.subscription_cancel_at = Some(at),
            None => {
                self.subscription_cancel_at = None;
                self.scheduled_account_deletion = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_keys_round_trip() {
        let raw = json!({
            "subscription": "sub_123",
            "display_name": "Ada",
            "avatar_url": "https://example.com/a.png",
        });

        let meta: UserMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(meta.subscription.as_deref(), Some("sub_123"));
        assert_eq!(meta.extra.get("display_name"), Some(&json!("Ada")));

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["display_name"], json!("Ada"));
        assert_eq!(back["avatar_url"], json!("https://example.com/a.png"));
    }

    #[test]
    fn cleared_fields_serialize_as_null() {
        let mut meta = UserMetadata::default();
        meta.subscription_cancel_at =
            Some(OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap());
        meta.scheduled_account_deletion = Some(true);

        meta.apply_cancellation(None);

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["subscription_cancel_at"], serde_json::Value::Null);
        assert_eq!(
            value["scheduled_account_deletion"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn cancel_at_parses_rfc3339() {
        let raw = json!({
            "subscription": "sub_9",
            "subscription_cancel_at": "2026-01-15T00:00:00Z",
        });

        let meta: UserMetadata = serde_json::from_value(raw).unwrap();
        let at = meta.subscription_cancel_at.unwrap();
        assert_eq!(at.year(), 2026);
    }
}
