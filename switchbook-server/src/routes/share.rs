//! Public collection pages addressed by shareable ID.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use switchbook_catalog::is_valid_shareable_id;
use switchbook_catalog::types::{Switch, SwitchImage, SwitchSpecs};
use switchbook_db::{SwitchFilter, find_user_by_shareable_id, list_switches};
use switchbook_moderation::regenerate_shareable_id;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/share/:shareable_id", get(shared_collection))
        .route("/user/shareable-id", post(regenerate))
}

/// A collection entry as shown to other people: no personal notes.
#[derive(Debug, Serialize)]
pub struct SharedSwitch {
    pub id: i64,
    #[serde(flatten)]
    pub specs: SwitchSpecs,
    pub quantity: i64,
    pub personal_tags: Vec<String>,
    pub is_lubed: bool,
    pub is_filmed: bool,
    pub is_modified: bool,
    pub franken_top: Option<String>,
    pub franken_bottom: Option<String>,
    pub franken_stem: Option<String>,
    pub master_switch_id: Option<String>,
    pub images: Vec<SwitchImage>,
}

impl From<Switch> for SharedSwitch {
    fn from(s: Switch) -> Self {
        let d = s.details;
        Self {
            id: s.id,
            specs: s.specs,
            quantity: d.quantity,
            personal_tags: d.personal_tags,
            is_lubed: d.is_lubed,
            is_filmed: d.is_filmed,
            is_modified: d.is_modified,
            franken_top: d.franken_top,
            franken_bottom: d.franken_bottom,
            franken_stem: d.franken_stem,
            master_switch_id: s.master_switch_id,
            images: s.images,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SharedCollection {
    pub username: String,
    pub total_switches: i64,
    pub switches: Vec<SharedSwitch>,
}

async fn shared_collection(
    State(state): State<AppState>,
    Path(shareable_id): Path<String>,
) -> Result<Json<SharedCollection>, AppError> {
    if !is_valid_shareable_id(&shareable_id) {
        return Err(AppError::not_found("Collection"));
    }
    let conn = state.db()?;
    let user = find_user_by_shareable_id(&conn, &shareable_id)?
        .ok_or_else(|| AppError::not_found("Collection"))?;
    let switches: Vec<SharedSwitch> = list_switches(&conn, user.id, &SwitchFilter::default())?
        .into_iter()
        .map(SharedSwitch::from)
        .collect();
    Ok(Json(SharedCollection {
        username: user.username,
        total_switches: switches.iter().map(|s| s.quantity).sum(),
        switches,
    }))
}

async fn regenerate(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    let shareable_id = regenerate_shareable_id(&conn, current.user.id)?;
    Ok(Json(json!({ "shareable_id": shareable_id })))
}
