//! # Users
//!
//! Customer management for admins, plus the profile update customers use on
//! their own account.

use std::sync::Arc;

use pupuk_core::validation::ProfileForm;
use pupuk_core::{Role, User};
use tracing::info;

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct UsersApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl UsersApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        UsersApi { api, cache }
    }

    pub async fn list(&self) -> ClientResult<Vec<User>> {
        self.cache.fetch(keys::USERS, || self.api.get("/users")).await
    }

    /// Accounts with the customer role, for the admin customer table.
    pub async fn customers(&self) -> ClientResult<Vec<User>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|u| u.role == Role::Customer)
            .collect())
    }

    pub async fn get(&self, id: &str) -> ClientResult<User> {
        let path = format!("/users/{}", id);
        self.cache
            .fetch(&keys::detail(keys::USERS, id), || self.api.get(&path))
            .await
    }

    pub async fn update(&self, id: &str, form: &ProfileForm) -> ClientResult<User> {
        form.validate()?;
        let user: User = self.api.put(&format!("/users/{}", id), form).await?;
        self.cache.invalidate(keys::USERS).await;
        info!(user_id = %id, "Profile updated");
        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.api.delete(&format!("/users/{}", id)).await?;
        self.cache.invalidate(keys::USERS).await;
        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::test_server;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn user_json(id: &str, name: &str, role: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "email": format!("{}@example.com", id),
            "role": role,
            "createdAt": "2026-01-05T08:00:00Z"
        })
    }

    async fn users_api(router: Router) -> UsersApi {
        let base = test_server::spawn(router).await;
        let api = ApiClient::new(&ClientConfig::with_base_url(base)).unwrap();
        UsersApi::new(api, Arc::new(QueryCache::new(Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_customers_excludes_admins() {
        let router = Router::new().route(
            "/api/users",
            get(|| async {
                Json(json!([
                    user_json("u1", "Admin Gudang", "admin"),
                    user_json("u2", "Budi", "customer"),
                    user_json("u3", "Sri", "customer"),
                ]))
            }),
        );
        let users = users_api(router).await;

        let customers = users.customers().await.unwrap();
        assert_eq!(customers.len(), 2);
        assert!(customers.iter().all(|u| !u.is_admin()));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let router = Router::new().route(
            "/api/users/{id}",
            put(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                let mut user = user_json(&id, body["name"].as_str().unwrap_or_default(), "customer");
                user["phone"] = body["phone"].clone();
                Json(user)
            }),
        );
        let users = users_api(router).await;

        let form = ProfileForm {
            name: "Budi Santoso".to_string(),
            email: "u2@example.com".to_string(),
            phone: Some("081234567890".to_string()),
            address: None,
        };
        let user = users.update("u2", &form).await.unwrap();
        assert_eq!(user.name, "Budi Santoso");
        assert_eq!(user.phone.as_deref(), Some("081234567890"));

        let invalid = ProfileForm {
            name: "B".to_string(),
            ..form
        };
        assert!(matches!(users.update("u2", &invalid).await, Err(ClientError::Core(_))));
    }

    #[tokio::test]
    async fn test_delete_forbidden_surfaces_message() {
        let router = Router::new().route(
            "/api/users/{id}",
            axum::routing::delete(|Path(_id): Path<String>| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "message": "Tidak dapat menghapus admin" })),
                )
            }),
        );
        let users = users_api(router).await;

        let err = users.delete("u1").await.unwrap_err();
        assert_eq!(err.user_message(), "Tidak dapat menghapus admin");
    }
}
