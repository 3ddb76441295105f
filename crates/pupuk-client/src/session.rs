//! # Session
//!
//! Account flows and the signed-in user.
//!
//! ## Route Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Session::enter_route(route)                         │
//! │                                                                         │
//! │  public route ──────────────────────────────► guard(cached user)       │
//! │                                                                         │
//! │  guest-only / protected / admin route                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET /auth/me ──200──► cache user ──┐                                  │
//! │       │                             ├──► guard(route, user)            │
//! │       └──401──► forget user ────────┘      Allow / RedirectToLogin /   │
//! │                                            Redirect                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session itself is the HTTP-only cookie in the [`ApiClient`] jar; the
//! user record here is only a cache of what `/auth/me` last said.

use std::sync::Arc;

use pupuk_core::auth::{guard, post_login_route, Access, GuardDecision, Route};
use pupuk_core::validation::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};
use pupuk_core::User;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::QueryCache;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// Auth endpoints answer with the user either bare or as `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserPayload {
    Wrapped { user: User },
    Bare(User),
}

impl UserPayload {
    fn into_user(self) -> User {
        match self {
            UserPayload::Wrapped { user } | UserPayload::Bare(user) => user,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    cache: Arc<QueryCache>,
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Session {
            api,
            cache,
            user: RwLock::new(None),
        }
    }

    /// The user `/auth/me` last confirmed, without asking again.
    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    // =========================================================================
    // Account Flows
    // =========================================================================

    /// Signs in and returns the user plus the route to continue to.
    ///
    /// `redirect` is the `?redirect=` value the guard put on the login link.
    pub async fn login(&self, form: &LoginForm, redirect: Option<&str>) -> ClientResult<(User, Route)> {
        form.validate()?;

        let payload: UserPayload = self.api.post("/auth/login", form).await?;
        let user = payload.into_user();

        // anything cached belongs to whoever was signed in before
        self.cache.clear().await;
        *self.user.write().await = Some(user.clone());

        let next = post_login_route(redirect, &user);
        info!(user_id = %user.id, role = ?user.role, next = %next, "Signed in");
        Ok((user, next))
    }

    /// Creates an account. The new user still has to sign in.
    pub async fn register(&self, form: &RegisterForm) -> ClientResult<User> {
        form.validate()?;
        let payload: UserPayload = self.api.post("/auth/register", form).await?;
        let user = payload.into_user();
        info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        match self.api.post_unit("/auth/logout", &json!({})).await {
            Ok(()) => {}
            // the cookie had already expired, which is what we wanted
            Err(e) if e.is_unauthorized() => debug!("Logout without an active session"),
            Err(e) => return Err(e),
        }

        *self.user.write().await = None;
        self.cache.clear().await;
        info!("Signed out");
        Ok(())
    }

    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> ClientResult<()> {
        form.validate()?;
        self.api.post_unit("/auth/forgot-password", form).await?;
        info!("Password reset requested");
        Ok(())
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> ClientResult<()> {
        form.validate()?;
        self.api.post_unit("/auth/reset-password", form).await?;
        info!("Password reset");
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Asks the backend who is signed in. `None` when the cookie is missing
    /// or expired.
    pub async fn whoami(&self) -> ClientResult<Option<User>> {
        let user = match self.api.get::<UserPayload>("/auth/me").await {
            Ok(payload) => Some(payload.into_user()),
            Err(e) if e.is_unauthorized() => None,
            Err(e) => return Err(e),
        };

        let mut cached = self.user.write().await;
        if cached.is_some() && user.is_none() {
            warn!("Session expired");
        }
        *cached = user.clone();
        Ok(user)
    }

    /// Decides entry to `route`, re-validating the session for every route
    /// that depends on who is signed in.
    pub async fn enter_route(&self, route: &Route) -> ClientResult<GuardDecision> {
        let user = match route.access() {
            Access::Public => self.current_user().await,
            _ => self.whoami().await?,
        };

        let decision = guard(route, user.as_ref());
        debug!(route = %route, ?decision, "Route guard");
        Ok(decision)
    }

    /// Like [`Session::enter_route`] but fails unless entry is allowed.
    pub async fn require(&self, route: &Route) -> ClientResult<User> {
        match self.enter_route(route).await? {
            GuardDecision::Allow => self.current_user().await.ok_or(ClientError::NotAuthenticated),
            GuardDecision::RedirectToLogin { .. } => Err(ClientError::NotAuthenticated),
            GuardDecision::Redirect { .. } => Err(ClientError::Api {
                status: 403,
                message: None,
            }),
        }
    }
}
