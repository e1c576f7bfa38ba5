use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use switchbook_catalog::types::Manufacturer;
use switchbook_db::search_manufacturers;
use switchbook_moderation::{ManufacturerSubmission, submit_manufacturer};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 50;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(search).post(submit))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub name: String,
}

/// Autocomplete over names and aliases.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Manufacturer>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let conn = state.db()?;
    let found = search_manufacturers(&conn, query.q.as_deref().unwrap_or(""), limit)?;
    Ok(Json(found))
}

async fn submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<ManufacturerSubmission>), AppError> {
    let conn = state.db()?;
    let submission = submit_manufacturer(&conn, &req.name, current.user.id)?;
    let status = if submission.created {
        log::info!(
            "User {} submitted manufacturer '{}'",
            current.user.id,
            submission.manufacturer.name
        );
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(submission)))
}
