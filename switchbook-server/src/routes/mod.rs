//! API route tree, mounted under `/api`.

mod admin;
mod auth;
mod manufacturers;
mod master_switches;
mod notifications;
mod share;
mod switches;
mod wishlist;

use std::str::FromStr;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

pub fn api() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::routes())
        .nest("/switches", switches::routes())
        .nest("/master-switches", master_switches::routes())
        .nest("/manufacturers", manufacturers::routes())
        .nest("/wishlist", wishlist::routes())
        .nest("/notifications", notifications::routes())
        .nest("/admin", admin::routes())
        .merge(share::routes())
}

/// Parse an optional query parameter; blank counts as absent.
fn parse_param<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, AppError>
where
    T::Err: std::fmt::Display,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|e| AppError::bad_request(format!("Invalid {name}: {e}"))),
        None => Ok(None),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
