use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use upkeep_maintenance::{ItemInput, MaintenanceItem};

use crate::app::{ApiJson, AppState};
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/category/{category_id}", get(list_by_category))
        .route("/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Vec<MaintenanceItem>>> {
    Ok(Json(state.maintenance.list_items(user.id())?))
}

async fn list_by_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(category_id): Path<String>,
) -> ApiResult<Json<Vec<MaintenanceItem>>> {
    Ok(Json(
        state
            .maintenance
            .list_items_by_category(user.id(), &category_id)?,
    ))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MaintenanceItem>> {
    Ok(Json(state.maintenance.get_item(user.id(), &id)?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(input): ApiJson<ItemInput>,
) -> ApiResult<(StatusCode, Json<MaintenanceItem>)> {
    let item = state.maintenance.create_item(user.id(), input)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ItemInput>,
) -> ApiResult<Json<MaintenanceItem>> {
    Ok(Json(state.maintenance.update_item(user.id(), &id, input)?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let item = state.maintenance.delete_item(user.id(), &id)?;
    Ok(Json(json!({
        "message": "Successfully deleted maintenance.",
        "data": item,
    })))
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::app::tests::{call, signup, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    pub(crate) async fn seed_item(app: &axum::Router, token: &str) -> Value {
        let (_, category) = call(
            app,
            Method::POST,
            "/api/categories",
            Some(token),
            Some(json!({"name": "House", "is_private": true})),
        )
        .await;
        let (status, item) = call(
            app,
            Method::POST,
            "/api/maintenance",
            Some(token),
            Some(json!({
                "title": "Replace smoke alarm batteries",
                "category_id": category["id"],
                "start_date": "2026-01-15T09:30:00Z",
                "repetition_unit": "month",
                "repetition_value": 6,
                "reminder_days_before": 7,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        item
    }

    #[tokio::test]
    async fn create_list_and_filter_by_category() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let item = seed_item(&app, &token).await;
        assert_eq!(item["start_date"], "2026-01-15");
        assert_eq!(item["repetition_unit"], "month");

        let (_, all) = call(&app, Method::GET, "/api/maintenance", Some(&token), None).await;
        assert_eq!(all, json!([item.clone()]));

        let uri = format!(
            "/api/maintenance/category/{}",
            item["category_id"].as_str().unwrap()
        );
        let (_, by_category) = call(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(by_category, json!([item]));
    }

    #[tokio::test]
    async fn missing_fields_and_unknown_ids() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/maintenance",
            Some(&token),
            Some(json!({"title": "No schedule"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, body) =
            call(&app, Method::GET, "/api/maintenance/nope", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Maintenance not found.");
    }

    #[tokio::test]
    async fn items_of_other_users_are_invisible() {
        let app = test_app();
        let alice = signup(&app, "alice@example.com").await;
        let bob = signup(&app, "bob@example.com").await;
        let item = seed_item(&app, &alice).await;
        let uri = format!("/api/maintenance/{}", item["id"].as_str().unwrap());

        let (status, _) = call(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], item["id"]);
    }

    #[tokio::test]
    async fn category_in_use_cannot_be_deleted() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let item = seed_item(&app, &token).await;
        let uri = format!("/api/categories/{}", item["category_id"].as_str().unwrap());
        let (status, _) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
