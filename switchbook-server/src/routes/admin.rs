//! Moderation queues, manufacturer tools, and user management.
//!
//! Every handler takes an [`AdminUser`], so non-admin callers get 401 before
//! any work happens.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use switchbook_catalog::types::{
    EditStatus, Manufacturer, MasterSwitch, MasterSwitchEdit, Role, SubmissionStatus, User,
};
use switchbook_db::{
    ManufacturerSummary, SiteStats, edits_by_status, list_manufacturers, list_users,
    master_switches_by_status, site_stats,
};
use switchbook_moderation::{
    EditApproval, MergeReport, approve_edit, approve_submission, change_role,
    delete_unused_manufacturer, merge_manufacturers, reject_edit, reject_submission,
    update_manufacturer, verify_manufacturer,
};

use super::parse_param;
use crate::auth::AdminUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/master-switches", get(submissions))
        .route("/master-switches/:id/approve", post(approve_master))
        .route("/master-switches/:id/reject", post(reject_master))
        .route("/edits", get(edits))
        .route("/edits/:id/approve", post(approve_suggestion))
        .route("/edits/:id/reject", post(reject_suggestion))
        .route("/manufacturers", get(manufacturers))
        .route("/manufacturers/:id", put(update_maker).delete(delete_maker))
        .route("/manufacturers/:id/verify", post(verify_maker))
        .route("/manufacturers/:id/merge", post(merge_maker))
        .route("/users", get(users))
        .route("/users/:id/role", put(set_role))
}

/// `?status=` filter. Missing means PENDING; `all` means no filter.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    fn wanted<T: FromStr>(&self) -> Result<Option<T>, AppError>
    where
        T::Err: std::fmt::Display,
    {
        match self.status.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            None | Some("") => parse_param("status", Some("PENDING")),
            status => parse_param("status", status),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateManufacturerRequest {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    /// The manufacturer that survives the merge.
    pub target_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

fn reason(body: Option<Json<RejectRequest>>) -> Option<String> {
    body.and_then(|Json(r)| r.reason)
}

async fn stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<SiteStats>, AppError> {
    let conn = state.db()?;
    Ok(Json(site_stats(&conn)?))
}

// ── Submissions ─────────────────────────────────────────────────────────────

async fn submissions(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<StatusQuery>,
) -> Result<Json<Vec<MasterSwitch>>, AppError> {
    let status = q.wanted::<SubmissionStatus>()?;
    let conn = state.db()?;
    Ok(Json(master_switches_by_status(&conn, status)?))
}

async fn approve_master(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MasterSwitch>, AppError> {
    let transition = {
        let conn = state.db()?;
        approve_submission(&conn, &admin, &id)?
    };
    state.deliver(transition.emails).await;
    Ok(Json(transition.record))
}

async fn reject_master(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<MasterSwitch>, AppError> {
    let reason = reason(body);
    let transition = {
        let conn = state.db()?;
        reject_submission(&conn, &admin, &id, reason.as_deref())?
    };
    state.deliver(transition.emails).await;
    Ok(Json(transition.record))
}

// ── Edits ───────────────────────────────────────────────────────────────────

async fn edits(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<StatusQuery>,
) -> Result<Json<Vec<MasterSwitchEdit>>, AppError> {
    let status = q.wanted::<EditStatus>()?;
    let conn = state.db()?;
    Ok(Json(edits_by_status(&conn, status)?))
}

async fn approve_suggestion(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EditApproval>, AppError> {
    let transition = {
        let conn = state.db()?;
        approve_edit(&conn, &admin, &id)?
    };
    state.deliver(transition.emails).await;
    Ok(Json(transition.record))
}

async fn reject_suggestion(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<MasterSwitchEdit>, AppError> {
    let reason = reason(body);
    let transition = {
        let conn = state.db()?;
        reject_edit(&conn, &admin, &id, reason.as_deref())?
    };
    state.deliver(transition.emails).await;
    Ok(Json(transition.record))
}

// ── Manufacturers ───────────────────────────────────────────────────────────

async fn manufacturers(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<ManufacturerSummary>>, AppError> {
    let conn = state.db()?;
    Ok(Json(list_manufacturers(&conn)?))
}

async fn update_maker(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateManufacturerRequest>,
) -> Result<Json<Manufacturer>, AppError> {
    let conn = state.db()?;
    let updated = update_manufacturer(&conn, id, req.name.as_deref(), req.aliases.as_deref())?;
    log::info!("Admin '{}' updated manufacturer {}", admin.username, id);
    Ok(Json(updated))
}

async fn delete_maker(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    delete_unused_manufacturer(&conn, id)?;
    log::info!("Admin '{}' deleted manufacturer {}", admin.username, id);
    Ok(Json(json!({ "success": true })))
}

async fn verify_maker(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<Manufacturer>, AppError> {
    let transition = {
        let conn = state.db()?;
        verify_manufacturer(&conn, id)?
    };
    state.deliver(transition.emails).await;
    Ok(Json(transition.record))
}

async fn merge_maker(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeReport>, AppError> {
    let conn = state.db()?;
    let report = merge_manufacturers(&conn, id, req.target_id)?;
    log::info!(
        "Admin '{}' merged manufacturer {} into '{}' ({} records updated)",
        admin.username,
        id,
        report.target.name,
        report.records_updated
    );
    Ok(Json(report))
}

// ── Users ───────────────────────────────────────────────────────────────────

async fn users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    let conn = state.db()?;
    Ok(Json(list_users(&conn)?))
}

async fn set_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<User>, AppError> {
    let conn = state.db()?;
    Ok(Json(change_role(&conn, &admin, id, req.role)?))
}
