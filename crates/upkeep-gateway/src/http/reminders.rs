use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use upkeep_maintenance::{NewReminder, Reminder, ReminderPatch};

use crate::app::{ApiJson, AppState};
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/maintenance/{maintenance_id}", get(list_for_item))
        .route("/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>, user: AuthUser) -> ApiResult<Json<Vec<Reminder>>> {
    Ok(Json(state.maintenance.list_reminders(user.id())?))
}

async fn list_for_item(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(maintenance_id): Path<String>,
) -> ApiResult<Json<Vec<Reminder>>> {
    Ok(Json(
        state
            .maintenance
            .list_reminders_for_item(user.id(), &maintenance_id)?,
    ))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Reminder>> {
    Ok(Json(state.maintenance.get_reminder(user.id(), &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewReminder>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let reminder = state.maintenance.create_reminder(user.id(), input)?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ReminderPatch>,
) -> ApiResult<Json<Reminder>> {
    Ok(Json(state.maintenance.update_reminder(user.id(), &id, patch)?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let reminder = state.maintenance.delete_reminder(user.id(), &id)?;
    Ok(Json(json!({
        "message": "Successfully deleted reminder",
        "data": reminder,
    })))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{call, signup, test_app};
    use crate::http::maintenance::tests::seed_item;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn create_mark_sent_and_delete() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let item = seed_item(&app, &token).await;

        let (status, reminder) = call(
            &app,
            Method::POST,
            "/api/reminders",
            Some(&token),
            Some(json!({"maintenance_id": item["id"], "due_date": "2026-07-08"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reminder["is_sent"], false);

        let uri = format!("/api/reminders/{}", reminder["id"].as_str().unwrap());
        let (status, sent) = call(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"is_sent": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sent["is_sent"], true);
        assert_eq!(sent["due_date"], "2026-07-08");

        let per_item = format!("/api/reminders/maintenance/{}", item["id"].as_str().unwrap());
        let (_, listed) = call(&app, Method::GET, &per_item, Some(&token), None).await;
        assert_eq!(listed, json!([sent]));

        let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully deleted reminder");
    }

    #[tokio::test]
    async fn reminders_of_unknown_item_are_404() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let (status, _) = call(
            &app,
            Method::GET,
            "/api/reminders/maintenance/missing",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
