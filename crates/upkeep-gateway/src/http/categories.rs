use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use upkeep_maintenance::{Category, CategoryInput};

use crate::app::{ApiJson, AppState};
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.maintenance.list_categories(user.id())?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.maintenance.get_category(user.id(), &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.maintenance.create_category(user.id(), input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.maintenance.update_category(user.id(), &id, input)?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let category = state.maintenance.delete_category(user.id(), &id)?;
    Ok(Json(json!({
        "message": "Category deleted successfully",
        "category": category,
    })))
}
