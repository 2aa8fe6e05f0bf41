use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use upkeep_maintenance::{EventPatch, MaintenanceEvent, NewEvent};

use crate::app::{ApiJson, AppState};
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/maintenance/{maintenance_id}", get(list_for_item))
        .route("/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MaintenanceEvent>>> {
    Ok(Json(state.maintenance.list_events(user.id())?))
}

async fn list_for_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(maintenance_id): Path<String>,
) -> ApiResult<Json<Vec<MaintenanceEvent>>> {
    Ok(Json(
        state
            .maintenance
            .list_events_for_item(user.id(), &maintenance_id)?,
    ))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MaintenanceEvent>> {
    Ok(Json(state.maintenance.get_event(user.id(), &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewEvent>,
) -> ApiResult<(StatusCode, Json<MaintenanceEvent>)> {
    let event = state.maintenance.create_event(user.id(), input)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /api/maintenance-events/{id}: complete, reopen or annotate.
async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<EventPatch>,
) -> ApiResult<Json<MaintenanceEvent>> {
    Ok(Json(state.maintenance.update_event(user.id(), &id, patch)?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let event = state.maintenance.delete_event(user.id(), &id)?;
    Ok(Json(json!({
        "message": "Successfully deleted maintenance event",
        "data": event,
    })))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{call, signup, test_app};
    use crate::http::maintenance::tests::seed_item;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn complete_and_reopen_event() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let item = seed_item(&app, &token).await;

        let (status, event) = call(
            &app,
            Method::POST,
            "/api/maintenance-events",
            Some(&token),
            Some(json!({"maintenance_id": item["id"], "due_date": "2026-07-15"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(event["completion_date"].is_null());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/maintenance-events",
            Some(&token),
            Some(json!({"maintenance_id": item["id"], "due_date": "2026-07-15"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let uri = format!("/api/maintenance-events/{}", event["id"].as_str().unwrap());
        let (status, done) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"completion_date": "2026-07-16", "notes": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["completion_date"], "2026-07-16");

        let (_, reopened) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"completion_date": null})),
        )
        .await;
        assert!(reopened["completion_date"].is_null());
        assert_eq!(reopened["notes"], "done");

        let per_item = format!(
            "/api/maintenance-events/maintenance/{}",
            item["id"].as_str().unwrap()
        );
        let (_, listed) = call(&app, Method::GET, &per_item, Some(&token), None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], event["id"]);
        let (status, _) = call(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
