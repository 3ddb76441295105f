//! # Account Commands
//!
//! Login, registration, password reset and the profile page. A successful
//! login writes the session cookie to disk so later commands stay signed
//! in; logout removes it.

use pupuk_core::auth::{GuardDecision, Route};
use pupuk_core::validation::{
    ForgotPasswordForm, LoginForm, ProfileForm, RegisterForm, ResetPasswordForm,
};
use pupuk_core::User;
use serde::Serialize;
use tracing::debug;

use crate::cli::{LoginArgs, ProfileArgs, RegisterArgs, ResetPasswordArgs};
use crate::commands::{render, OutputFormat};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::output;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    /// Route to open next: the saved return path or the role home.
    pub next: String,
}

/// Guest-only commands refuse a signed-in user.
async fn require_guest(state: &AppState, route: Route) -> ApiResult<()> {
    match state.storefront().session().enter_route(&route).await? {
        GuardDecision::Allow => Ok(()),
        _ => Err(ApiError::new(
            ErrorCode::BusinessLogic,
            "Already signed in. Run `pupuk logout` first.",
        )),
    }
}

pub async fn login(state: &AppState, args: &LoginArgs, format: OutputFormat) -> ApiResult<String> {
    require_guest(state, Route::Login).await?;
    debug!(email = %args.email, "login");

    let form = LoginForm {
        email: args.email.trim().to_string(),
        password: args.password.clone(),
    };
    let (user, next) = state
        .storefront()
        .session()
        .login(&form, args.redirect.as_deref())
        .await?;
    state.persist_session()?;

    let response = LoginResponse {
        user,
        next: next.path(),
    };
    render(format, &response, |r| {
        format!("Signed in as {} <{}>. Continue at {}", r.user.name, r.user.email, r.next)
    })
}

pub async fn register(state: &AppState, args: &RegisterArgs, format: OutputFormat) -> ApiResult<String> {
    require_guest(state, Route::Register).await?;
    debug!(email = %args.email, "register");

    let form = RegisterForm {
        name: args.name.trim().to_string(),
        email: args.email.trim().to_string(),
        phone: args.phone.trim().to_string(),
        password: args.password.clone(),
        confirm_password: args.confirm_password.clone(),
    };
    let user = state.storefront().session().register(&form).await?;
    render(format, &user, |u| {
        format!("Account created for {}. Sign in with `pupuk login {}`.", u.name, u.email)
    })
}

pub async fn logout(state: &AppState) -> ApiResult<String> {
    debug!("logout");
    state.storefront().session().logout().await?;
    state.forget_session()?;
    Ok("Signed out.".to_string())
}

pub async fn whoami(state: &AppState, format: OutputFormat) -> ApiResult<String> {
    let user = state.storefront().session().require(&Route::Profile).await?;
    render(format, &user, output::user)
}

pub async fn forgot_password(state: &AppState, email: &str) -> ApiResult<String> {
    require_guest(state, Route::ForgotPassword).await?;
    let form = ForgotPasswordForm {
        email: email.trim().to_string(),
    };
    state.storefront().session().forgot_password(&form).await?;
    Ok(format!(
        "If {} has an account, a reset link is on its way.",
        form.email
    ))
}

pub async fn reset_password(state: &AppState, args: &ResetPasswordArgs) -> ApiResult<String> {
    require_guest(state, Route::ResetPassword).await?;
    let form = ResetPasswordForm {
        token: args.token.trim().to_string(),
        password: args.password.clone(),
        confirm_password: args.confirm_password.clone(),
    };
    state.storefront().session().reset_password(&form).await?;
    Ok("Password changed. Sign in with your new password.".to_string())
}

/// Profile form: the given flags over the current values.
pub fn merge_profile(current: &User, args: &ProfileArgs) -> ProfileForm {
    let trimmed = |s: &String| s.trim().to_string();
    ProfileForm {
        name: args.name.as_ref().map(trimmed).unwrap_or_else(|| current.name.clone()),
        email: args.email.as_ref().map(trimmed).unwrap_or_else(|| current.email.clone()),
        phone: args.phone.as_ref().map(trimmed).or_else(|| current.phone.clone()),
        address: args.address.as_ref().map(trimmed).or_else(|| current.address.clone()),
    }
}

pub async fn update_profile(state: &AppState, args: &ProfileArgs, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    let user = storefront.session().require(&Route::Profile).await?;
    debug!(user_id = %user.id, "update_profile");

    let form = merge_profile(&user, args);
    let updated = storefront.users().update(&user.id, &form).await?;
    render(format, &updated, output::user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pupuk_core::Role;

    #[test]
    fn test_merge_profile_keeps_unset_fields() {
        let current = User {
            id: "u1".to_string(),
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
            phone: Some("081234567890".to_string()),
            address: None,
            role: Role::Customer,
            created_at: Utc::now(),
        };
        let args = ProfileArgs {
            address: Some("  Jl. Merdeka 1 ".to_string()),
            ..ProfileArgs::default()
        };

        let form = merge_profile(&current, &args);
        assert_eq!(form.name, "Budi");
        assert_eq!(form.phone.as_deref(), Some("081234567890"));
        assert_eq!(form.address.as_deref(), Some("Jl. Merdeka 1"));
        assert!(form.validate().is_ok());
    }
}
