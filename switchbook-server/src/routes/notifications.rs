use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use switchbook_catalog::types::Notification;
use switchbook_db::{
    list_notifications, mark_all_notifications_read, mark_notification_read,
    unread_notification_count,
};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(read_all))
        .route("/:id/read", post(read))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<u32>,
}

async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let conn = state.db()?;
    Ok(Json(list_notifications(&conn, current.user.id, q.unread, limit)?))
}

async fn unread_count(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    let count = unread_notification_count(&conn, current.user.id)?;
    Ok(Json(json!({ "count": count })))
}

async fn read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    mark_notification_read(&conn, current.user.id, id)?;
    Ok(Json(json!({ "success": true })))
}

async fn read_all(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    let marked = mark_all_notifications_read(&conn, current.user.id)?;
    Ok(Json(json!({ "marked": marked })))
}
