//! HTTP error type. Every failure leaves the server as `{"message": "..."}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};
use upkeep_maintenance::MaintenanceError;
use upkeep_users::UserError;

const SERVER_ERROR: &str = "Something went wrong, server error.";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 500 with a generic message; the detail only goes to the log.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("request failed: {detail}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation(_) | UserError::AlreadyExists => {
                ApiError::new(StatusCode::BAD_REQUEST, e.to_string())
            }
            UserError::InvalidCredentials => ApiError::new(StatusCode::UNAUTHORIZED, e.to_string()),
            UserError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "User not found."),
            UserError::InvalidToken(_) => {
                ApiError::new(StatusCode::FORBIDDEN, "Invalid or expired token.")
            }
            UserError::Hashing(_) | UserError::DatabaseError(_) => ApiError::internal(e),
        }
    }
}

impl From<MaintenanceError> for ApiError {
    fn from(e: MaintenanceError) -> Self {
        match e {
            MaintenanceError::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, e.to_string()),
            MaintenanceError::Validation(_) => ApiError::new(StatusCode::BAD_REQUEST, e.to_string()),
            MaintenanceError::Conflict(_) | MaintenanceError::CategoryInUse => {
                ApiError::new(StatusCode::CONFLICT, e.to_string())
            }
            MaintenanceError::Database(_) => ApiError::internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {rejection}");
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_map_to_statuses() {
        assert_eq!(ApiError::from(UserError::AlreadyExists).status, StatusCode::BAD_REQUEST);
        let wrong = ApiError::from(UserError::InvalidCredentials);
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.message, "Wrong email or password.");
        assert_eq!(
            ApiError::from(UserError::Hashing("boom".into())).message,
            SERVER_ERROR
        );
    }

    #[test]
    fn maintenance_errors_map_to_statuses() {
        let missing = ApiError::from(MaintenanceError::NotFound { entity: "Reminder" });
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Reminder not found.");
        assert_eq!(
            ApiError::from(MaintenanceError::CategoryInUse).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(MaintenanceError::Validation("x".into())).status,
            StatusCode::BAD_REQUEST
        );
    }
}
