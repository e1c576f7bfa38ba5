//! Password hashing, session cookies, and the user extractors.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand_core::OsRng;
use switchbook_catalog::types::User;
use switchbook_db::find_session_user;

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "switchbook_session";

/// Reset tokens expire after this many minutes.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub(crate) fn hash_for_request(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

fn lookup(parts: &Parts, state: &AppState) -> Result<Option<CurrentUser>, AppError> {
    let Some(token) = session_token(parts) else {
        return Ok(None);
    };
    let conn = state.db()?;
    Ok(find_session_user(&conn, &token)?.map(|user| CurrentUser { user, token }))
}

/// The logged-in caller. Rejects with 401 without a valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        lookup(parts, state)?.ok_or_else(AppError::unauthorized)
    }
}

/// A logged-in administrator. Everyone else gets 401.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = lookup(parts, state)?.ok_or_else(AppError::unauthorized)?;
        if !current.user.role.is_admin() {
            return Err(AppError::Unauthorized(
                "Administrator privileges required".to_string(),
            ));
        }
        Ok(Self(current.user))
    }
}

/// The caller if logged in, for routes that also serve anonymous visitors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(lookup(parts, state)?.map(|c| c.user)))
    }
}
