//! Route definitions

pub mod account;
pub mod plans;
pub mod stripe_webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/stripe/webhook", post(stripe_webhook::handle_webhook))
        .route("/api/plans", get(plans::list_plans))
        .route("/api/account", post(account::delete_account))
        .route(
            "/api/account/delete/cancel-delete",
            post(account::cancel_delete),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use hmac::{Hmac, Mac};
    use serde_json::{json, Value};
    use sha2::Sha256;
    use tower::util::ServiceExt;

    use launchkit_billing::{StripeClient, StripeConfig};
    use launchkit_identity::{
        DirectoryUser, IdentityResult, NewUser, UserDirectory, UserMetadata,
    };

    use crate::config::Config;

    /// Identity-provider stand-in; "valid-token" authenticates as the first
    /// stored user
    #[derive(Default)]
    struct FakeDirectory {
        users: Mutex<Vec<DirectoryUser>>,
    }

    impl FakeDirectory {
        fn with_user(user: DirectoryUser) -> Arc<Self> {
            let dir = Self::default();
            dir.users.lock().unwrap().push(user);
            Arc::new(dir)
        }

        fn user(&self, id: &str) -> Option<DirectoryUser> {
            self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn get_user_by_id(&self, id: &str) -> IdentityResult<Option<DirectoryUser>> {
            Ok(self.user(id))
        }

        async fn list_users(&self, page: u32, per_page: u32) -> IdentityResult<Vec<DirectoryUser>> {
            let start = ((page - 1) * per_page) as usize;
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .skip(start)
                .take(per_page as usize)
                .cloned()
                .collect())
        }

        async fn update_user_metadata(
            &self,
            id: &str,
            metadata: &UserMetadata,
        ) -> IdentityResult<()> {
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter_mut().find(|u| u.id == id) {
                user.metadata = metadata.clone();
            }
            Ok(())
        }

        async fn create_user(&self, new_user: NewUser) -> IdentityResult<DirectoryUser> {
            let user = DirectoryUser {
                id: "created-1".to_string(),
                email: Some(new_user.email),
                metadata: new_user.metadata,
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn invite_by_email(&self, _email: &str) -> IdentityResult<()> {
            Ok(())
        }

        async fn get_user_by_token(&self, token: &str) -> IdentityResult<Option<DirectoryUser>> {
            if token == "valid-token" {
                Ok(self.users.lock().unwrap().first().cloned())
            } else {
                Ok(None)
            }
        }

        async fn delete_user(&self, id: &str) -> IdentityResult<()> {
            self.users.lock().unwrap().retain(|u| u.id != id);
            Ok(())
        }
    }

    fn test_router(directory: Arc<FakeDirectory>) -> Router {
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            allowed_origins: Vec::new(),
        };
        let stripe = StripeClient::new(StripeConfig {
            secret_key: "sk_test_1".to_string(),
            webhook_secret: "whsec_testsecret".to_string(),
        });
        create_router(AppState::new(config, directory, stripe))
    }

    fn sign_header(payload: &str) -> String {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let mut mac = Hmac::<Sha256>::new_from_slice(b"testsecret").unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn subscriber(id: &str, subscription: Option<&str>) -> DirectoryUser {
        DirectoryUser {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
            metadata: UserMetadata {
                subscription: subscription.map(str::to_string),
                ..UserMetadata::default()
            },
        }
    }

    #[tokio::test]
    async fn health_check_responds() {
        let router = test_router(Arc::new(FakeDirectory::default()));

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_without_signature_header_is_rejected() {
        let router = test_router(Arc::new(FakeDirectory::default()));

        let response = router
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_with_forged_signature_is_rejected() {
        let router = test_router(Arc::new(FakeDirectory::default()));

        let response = router
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .header("stripe-signature", "t=1,v1=deadbeef")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signed_unknown_event_is_acknowledged() {
        let router = test_router(Arc::new(FakeDirectory::default()));
        let payload = json!({
            "id": "evt_1",
            "type": "price.created",
            "data": { "object": {} },
        })
        .to_string();

        let response = router
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .header("stripe-signature", sign_header(&payload))
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "received": true }));
    }

    #[tokio::test]
    async fn signed_invoice_event_reaches_the_directory() {
        let dir = FakeDirectory::with_user(subscriber("user-1", None));
        let router = test_router(dir.clone());
        let payload = json!({
            "id": "evt_2",
            "type": "invoice.payment_succeeded",
            "data": { "object": {
                "metadata": { "sub": "user-1" },
                "subscription": "sub_9",
            }},
        })
        .to_string();

        let response = router
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .header("stripe-signature", sign_header(&payload))
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let user = dir.user("user-1").unwrap();
        assert_eq!(user.metadata.subscription.as_deref(), Some("sub_9"));
    }

    #[tokio::test]
    async fn signed_event_for_unknown_user_is_a_server_error() {
        // A 500 makes Stripe redeliver, giving provisioning lag a chance
        // to resolve
        let router = test_router(Arc::new(FakeDirectory::default()));
        let payload = json!({
            "id": "evt_3",
            "type": "customer.subscription.updated",
            "data": { "object": {
                "id": "sub_1",
                "cancel_at_period_end": false,
                "metadata": { "sub": "ghost" },
            }},
        })
        .to_string();

        let response = router
            .oneshot(
                Request::post("/api/stripe/webhook")
                    .header("stripe-signature", sign_header(&payload))
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn account_deletion_requires_a_bearer_token() {
        let router = test_router(Arc::new(FakeDirectory::default()));

        let response = router
            .oneshot(
                Request::post("/api/account").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deletion_is_deferred_while_subscribed() {
        let dir = FakeDirectory::with_user(subscriber("user-1", Some("sub_1")));
        let router = test_router(dir.clone());

        let response = router
            .oneshot(
                Request::post("/api/account")
                    .header("authorization", "Bearer valid-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "scheduled" }));
        let user = dir.user("user-1").unwrap();
        assert_eq!(user.metadata.scheduled_account_deletion, Some(true));
    }

    #[tokio::test]
    async fn unsubscribed_account_is_deleted_immediately() {
        let dir = FakeDirectory::with_user(subscriber("user-1", None));
        let router = test_router(dir.clone());

        let response = router
            .oneshot(
                Request::post("/api/account")
                    .header("authorization", "Bearer valid-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "deleted" }));
        assert!(dir.user("user-1").is_none());
    }

    #[tokio::test]
    async fn cancel_delete_clears_the_flag() {
        let mut user = subscriber("user-1", Some("sub_1"));
        user.metadata.scheduled_account_deletion = Some(true);
        let dir = FakeDirectory::with_user(user);
        let router = test_router(dir.clone());

        let response = router
            .oneshot(
                Request::post("/api/account/delete/cancel-delete")
                    .header("authorization", "Bearer valid-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "status": "cancelled" }));
        let user = dir.user("user-1").unwrap();
        assert_eq!(user.metadata.scheduled_account_deletion, None);
        assert_eq!(user.metadata.subscription.as_deref(), Some("sub_1"));
    }
}
