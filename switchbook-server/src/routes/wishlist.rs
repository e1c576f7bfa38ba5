use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use switchbook_catalog::types::{CollectionDetails, Switch, WishlistInput, WishlistItem};
use switchbook_db::{WishlistEntry, delete_wishlist_item, list_wishlist};
use switchbook_moderation::{add_to_wishlist, move_wishlist_to_collection};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(add))
        .route("/:id", delete(remove))
        .route("/:id/move-to-collection", post(move_to_collection))
}

async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<WishlistEntry>>, AppError> {
    let conn = state.db()?;
    Ok(Json(list_wishlist(&conn, current.user.id)?))
}

async fn add(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(input): Json<WishlistInput>,
) -> Result<(StatusCode, Json<WishlistItem>), AppError> {
    let conn = state.db()?;
    let item = add_to_wishlist(&conn, current.user.id, &input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let conn = state.db()?;
    delete_wishlist_item(&conn, current.user.id, id)?;
    Ok(Json(json!({ "success": true })))
}

async fn move_to_collection(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    details: Option<Json<CollectionDetails>>,
) -> Result<(StatusCode, Json<Switch>), AppError> {
    let details = details.map(|Json(d)| d).unwrap_or_default();
    let conn = state.db()?;
    let switch = move_wishlist_to_collection(&conn, current.user.id, id, &details)?;
    Ok((StatusCode::CREATED, Json(switch)))
}
