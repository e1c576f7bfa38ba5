//! Account and session endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use switchbook_catalog::types::{Role, User};
use switchbook_catalog::validation::validate_password;
use switchbook_db::{
    create_session, delete_session, delete_user_sessions, find_user_by_email, find_user_by_login,
    find_user_by_reset_token, set_reset_token, update_password,
};
use switchbook_moderation::{EmailMessage, create_account};

use crate::auth::{
    CurrentUser, RESET_TOKEN_TTL_MINUTES, expired_session_cookie, hash_for_request,
    session_cookie, verify_password,
};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

fn start_session(state: &AppState, jar: CookieJar, user_id: i64) -> Result<CookieJar, AppError> {
    let conn = state.db()?;
    let session = create_session(&conn, user_id, state.config.session_ttl_hours)?;
    Ok(jar.add(session_cookie(session.token, state.config.secure_cookies)))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<User>), AppError> {
    validate_password(&req.password)?;
    let hash = hash_for_request(&req.password)?;
    let user = {
        let conn = state.db()?;
        create_account(&conn, &req.username, &req.email, &hash, Role::User)?
    };
    log::info!("Registered user '{}'", user.username);
    let jar = start_session(&state, jar, user.id)?;
    Ok((StatusCode::CREATED, jar, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<User>), AppError> {
    let user = {
        let conn = state.db()?;
        find_user_by_login(&conn, &req.login)?
    };
    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    };
    let jar = start_session(&state, jar, user.id)?;
    Ok((jar, Json(user)))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    {
        let conn = state.db()?;
        delete_session(&conn, &current.token)?;
    }
    Ok((jar.remove(expired_session_cookie()), Json(json!({ "success": true }))))
}

async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    if !verify_password(&req.current_password, &current.user.password_hash) {
        return Err(AppError::bad_request("Current password is incorrect"));
    }
    validate_password(&req.new_password)?;
    let hash = hash_for_request(&req.new_password)?;

    let conn = state.db()?;
    update_password(&conn, current.user.id, &hash)?;
    let ended = delete_user_sessions(&conn, current.user.id, Some(&current.token))?;
    log::info!(
        "User '{}' changed password, ended {} other session(s)",
        current.user.username,
        ended
    );
    Ok(Json(json!({ "success": true })))
}

/// Always answers 200 so the endpoint cannot be used to probe for accounts.
async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let email = {
        let conn = state.db()?;
        match find_user_by_email(&conn, req.email.trim())? {
            Some(user) => {
                let token = uuid::Uuid::new_v4().to_string();
                set_reset_token(&conn, user.id, &token, RESET_TOKEN_TTL_MINUTES)?;
                Some(EmailMessage {
                    to: user.email,
                    subject: "[Switchbook] Password reset".to_string(),
                    body: format!(
                        "Hi {},\n\nUse this link to choose a new password. It expires in one hour.\n\n{}\n",
                        user.username,
                        state.link(&format!("/reset-password?token={token}")),
                    ),
                })
            }
            None => {
                log::debug!("Password reset requested for unknown email");
                None
            }
        }
    };
    state.mailer.send_all(email.into_iter().collect()).await;
    Ok(Json(json!({
        "message": "If an account exists for that email, a reset link has been sent"
    })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    validate_password(&req.password)?;
    let hash = hash_for_request(&req.password)?;

    let conn = state.db()?;
    let user = find_user_by_reset_token(&conn, req.token.trim())?
        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;
    update_password(&conn, user.id, &hash)?;
    delete_user_sessions(&conn, user.id, None)?;
    log::info!("Password reset for user '{}'", user.username);
    Ok(Json(json!({ "success": true })))
}
