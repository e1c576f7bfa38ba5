//! The caller's own collection.

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use switchbook_catalog::types::{Switch, SwitchImage, SwitchInput};
use switchbook_catalog::validation::validate_url;
use switchbook_catalog::{read_collection, write_collection};
use switchbook_db::{
    CollectionStats, OutdatedSwitch, SwitchFilter, add_switch_image, collection_stats,
    delete_switch_image, get_user_switch, list_switches, outdated_switches,
    reorder_switch_images,
};
use switchbook_moderation::{ImportReport, create_switch, import_collection, sync_with_master};

use super::{non_blank, parse_param};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/stats", get(stats))
        .route("/export", get(export))
        .route("/import", post(import))
        .route("/outdated", get(outdated))
        .route("/:id", get(show).put(update).delete(remove))
        .route("/:id/sync", post(sync))
        .route("/:id/images", post(add_image))
        .route("/:id/images/order", put(reorder_images))
        .route("/:id/images/:image_id", delete(remove_image))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub switch_type: Option<String>,
    pub technology: Option<String>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageOrderRequest {
    pub image_ids: Vec<i64>,
}

fn owned_switch(state: &AppState, user_id: i64, id: i64) -> Result<Switch, AppError> {
    let conn = state.db()?;
    get_user_switch(&conn, user_id, id)?.ok_or_else(|| AppError::not_found("Switch"))
}

async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Switch>>, AppError> {
    let filter = SwitchFilter {
        search: non_blank(q.search),
        switch_type: parse_param("type", q.switch_type.as_deref())?,
        technology: parse_param("technology", q.technology.as_deref())?,
        manufacturer: non_blank(q.manufacturer),
    };
    let conn = state.db()?;
    Ok(Json(list_switches(&conn, current.user.id, &filter)?))
}

async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<SwitchInput>,
) -> Result<(StatusCode, Json<Switch>), AppError> {
    let conn = state.db()?;
    let switch = create_switch(&conn, current.user.id, &input)?;
    Ok((StatusCode::CREATED, Json(switch)))
}

async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Switch>, AppError> {
    Ok(Json(owned_switch(&state, current.user.id, id)?))
}

async fn update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(input): Json<SwitchInput>,
) -> Result<Json<Switch>, AppError> {
    let conn = state.db()?;
    let switch = switchbook_moderation::update_switch(&conn, current.user.id, id, &input)?;
    Ok(Json(switch))
}

async fn remove(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    switchbook_moderation::delete_switch(&conn, current.user.id, id)?;
    Ok(Json(json!({ "success": true })))
}

async fn stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<CollectionStats>, AppError> {
    let conn = state.db()?;
    Ok(Json(collection_stats(&conn, current.user.id)?))
}

async fn export(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let switches = {
        let conn = state.db()?;
        list_switches(&conn, current.user.id, &SwitchFilter::default())?
    };
    let mut body = Vec::new();
    write_collection(&mut body, &switches)
        .map_err(|e| AppError::Internal(format!("CSV export failed: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"switchbook-collection.csv\"",
            ),
        ],
        body,
    ))
}

/// The request body is the CSV text itself.
async fn import(
    State(state): State<AppState>,
    current: CurrentUser,
    body: String,
) -> Result<Json<ImportReport>, AppError> {
    let parsed = read_collection(body.as_bytes())?;
    let conn = state.db()?;
    let report = import_collection(&conn, current.user.id, parsed)?;
    log::info!(
        "Imported {} switch(es) for user {} ({} row error(s))",
        report.created,
        current.user.id,
        report.errors.len()
    );
    Ok(Json(report))
}

async fn outdated(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<OutdatedSwitch>>, AppError> {
    let conn = state.db()?;
    Ok(Json(outdated_switches(&conn, current.user.id)?))
}

async fn sync(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Switch>, AppError> {
    let conn = state.db()?;
    Ok(Json(sync_with_master(&conn, current.user.id, id)?))
}

async fn add_image(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ImageRequest>,
) -> Result<(StatusCode, Json<SwitchImage>), AppError> {
    validate_url("url", &req.url)?;
    owned_switch(&state, current.user.id, id)?;
    let conn = state.db()?;
    let image = add_switch_image(&conn, id, &req.url)?;
    Ok((StatusCode::CREATED, Json(image)))
}

async fn remove_image(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((id, image_id)): Path<(i64, i64)>,
) -> Result<Json<Value>, AppError> {
    owned_switch(&state, current.user.id, id)?;
    let conn = state.db()?;
    let tx = conn.unchecked_transaction()?;
    delete_switch_image(&tx, id, image_id)?;
    tx.commit()?;
    Ok(Json(json!({ "success": true })))
}

async fn reorder_images(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<ImageOrderRequest>,
) -> Result<Json<Vec<SwitchImage>>, AppError> {
    let switch = owned_switch(&state, current.user.id, id)?;
    let conn = state.db()?;
    let tx = conn.unchecked_transaction()?;
    reorder_switch_images(&tx, switch.id, &req.image_ids)?;
    tx.commit()?;
    Ok(Json(switchbook_db::switch_images(&conn, id)?))
}
