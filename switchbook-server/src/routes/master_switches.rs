//! Master switch browsing, submission, and edit suggestions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};
use switchbook_catalog::types::{
    CollectionDetails, EditStatus, MasterSwitch, MasterSwitchEdit, SubmissionStatus, Switch,
    SwitchSpecs, User,
};
use switchbook_db::{
    DEFAULT_PAGE_SIZE, MasterSort, MasterSwitchQuery, Page, edits_for_master, get_master_switch,
    list_master_switches, master_switches_by_submitter,
};
use switchbook_moderation::{
    add_master_to_collection, submit_master_switch, suggest_edit, view_master_switch,
};

use super::{non_blank, parse_param};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(submit))
        .route("/mine", get(mine))
        .route("/:id", get(show))
        .route("/:id/add-to-collection", post(add_to_collection))
        .route("/:id/edits", get(list_edits).post(create_edit))
}

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub switch_type: Option<String>,
    pub technology: Option<String>,
    pub manufacturer: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BrowseQuery {
    fn into_query(self) -> Result<MasterSwitchQuery, AppError> {
        let sort = match non_blank(self.sort) {
            Some(s) => MasterSort::from_str_loose(&s)
                .ok_or_else(|| AppError::bad_request(format!("Invalid sort: '{s}'")))?,
            None => MasterSort::default(),
        };
        Ok(MasterSwitchQuery {
            search: non_blank(self.search),
            switch_type: parse_param("type", self.switch_type.as_deref())?,
            technology: parse_param("technology", self.technology.as_deref())?,
            manufacturer: non_blank(self.manufacturer),
            sort,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EditsQuery {
    pub status: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    Query(q): Query<BrowseQuery>,
) -> Result<Json<Page<MasterSwitch>>, AppError> {
    let query = q.into_query()?;
    let conn = state.db()?;
    Ok(Json(list_master_switches(&conn, &query)?))
}

async fn submit(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(specs): Json<SwitchSpecs>,
) -> Result<(StatusCode, Json<MasterSwitch>), AppError> {
    let conn = state.db()?;
    let master = submit_master_switch(&conn, current.user.id, &specs)?;
    Ok((StatusCode::CREATED, Json(master)))
}

async fn mine(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<MasterSwitch>>, AppError> {
    let conn = state.db()?;
    Ok(Json(master_switches_by_submitter(&conn, current.user.id)?))
}

async fn show(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<MasterSwitch>, AppError> {
    let conn = state.db()?;
    Ok(Json(view_master_switch(&conn, user.as_ref(), &id)?))
}

/// The body is optional; without one the entry gets default details.
async fn add_to_collection(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    details: Option<Json<CollectionDetails>>,
) -> Result<(StatusCode, Json<Switch>), AppError> {
    let details = details.map(|Json(d)| d).unwrap_or_default();
    let conn = state.db()?;
    let switch = add_master_to_collection(&conn, current.user.id, &id, &details)?;
    Ok((StatusCode::CREATED, Json(switch)))
}

fn can_see(master: &MasterSwitch, user: Option<&User>) -> bool {
    master.status == SubmissionStatus::Approved
        || user.is_some_and(|u| u.role.is_admin() || master.submitted_by_id == Some(u.id))
}

async fn list_edits(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Query(q): Query<EditsQuery>,
) -> Result<Json<Vec<MasterSwitchEdit>>, AppError> {
    let status: Option<EditStatus> = parse_param("status", q.status.as_deref())?;
    let conn = state.db()?;
    match get_master_switch(&conn, &id)? {
        Some(master) if can_see(&master, user.as_ref()) => {
            Ok(Json(edits_for_master(&conn, &id, status)?))
        }
        _ => Err(AppError::not_found("Master switch")),
    }
}

/// The body is a partial object of spec fields to change.
async fn create_edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<MasterSwitchEdit>), AppError> {
    let conn = state.db()?;
    let edit = suggest_edit(&conn, current.user.id, &id, &changes)?;
    Ok((StatusCode::CREATED, Json(edit)))
}
