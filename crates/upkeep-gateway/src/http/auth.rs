//! Account endpoints under /api/auth.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use upkeep_users::PublicUser;

use crate::app::{ApiJson, AppState};
use crate::auth::AuthUser;
use crate::error::ApiResult;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", delete(delete_account))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/change-password", patch(change_password))
}

// Missing fields deserialize as empty so the store reports them uniformly.
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.users.register(&req.name, &req.email, &req.password)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User successfully created!",
            "user": PublicUser::from(&user),
        })),
    ))
}

/// POST /api/auth/login. Returns a bearer token and the public profile.
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<Value>> {
    let user = PublicUser::from(&state.users.authenticate(&req.email, &req.password)?);
    let token = state.tokens.issue(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(json!({ "token": token, "user": user })))
}

/// PATCH /api/auth/change-password
async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .users
        .change_password(user.id(), &req.current_password, &req.new_password)?;
    Ok(Json(json!({ "message": "Password changed successfully." })))
}

/// DELETE /api/auth. Removes the account and everything it owns.
///
/// The account row goes first: a failure there leaves everything intact, and
/// rows orphaned by a failed purge are unreachable without the account.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    state.users.delete(user.id())?;
    if let Err(e) = state.maintenance.purge_user(user.id()) {
        error!(user_id = %user.id(), "account deleted but its data was not purged: {e}");
        return Err(e.into());
    }
    Ok(Json(json!({ "message": "Account deleted successfully." })))
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{call, signup, test_app};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn register_returns_public_user() {
        let app = test_app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Ada", "email": "Ada@Example.com ", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User successfully created!");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_and_duplicates() {
        let app = test_app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"email": "a@b.c"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please include all information");

        signup(&app, "a@b.c").await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"name": "Again", "email": "a@b.c", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists.");
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let app = test_app();
        signup(&app, "a@b.c").await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@b.c", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Wrong email or password.");
    }

    #[tokio::test]
    async fn change_password_then_login_with_new_one() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;

        let (status, _) = call(
            &app,
            Method::PATCH,
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"current_password": "wrong", "new_password": "new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::PATCH,
            "/api/auth/change-password",
            Some(&token),
            Some(json!({"current_password": "hunter22", "new_password": "new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@b.c", "password": "new-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_account_purges_data() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/categories",
            Some(&token),
            Some(json!({"name": "House"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(&app, Method::DELETE, "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        // The token is still cryptographically valid but owns nothing now.
        let (_, body) = call(&app, Method::GET, "/api/categories", Some(&token), None).await;
        assert_eq!(body, json!([]));
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "a@b.c", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn failed_account_delete_keeps_data() {
        let app = test_app();
        let token = signup(&app, "a@b.c").await;
        let (status, _) = call(&app, Method::DELETE, "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        // The stale token still signs requests, so it can own rows again.
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/categories",
            Some(&token),
            Some(json!({"name": "Garden"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // No account row to delete: nothing else is touched.
        let (status, body) = call(&app, Method::DELETE, "/api/auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found.");
        let (_, body) = call(&app, Method::GET, "/api/categories", Some(&token), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
