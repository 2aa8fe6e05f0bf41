use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request},
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;
use upkeep_core::UpkeepConfig;
use upkeep_maintenance::MaintenanceStore;
use upkeep_scheduler::RunHistory;
use upkeep_users::{TokenSigner, UserStore};

use crate::error::ApiError;
use crate::http;

/// Central shared state, passed as Arc<AppState> to all Axum handlers.
///
/// Each store owns its own SQLite connection; the scheduler engine opens
/// separate ones for its writes.
pub struct AppState {
    pub config: UpkeepConfig,
    pub users: UserStore,
    pub maintenance: MaintenanceStore,
    pub tokens: TokenSigner,
    /// Read side of the job's run history, for `/health`.
    pub runs: RunHistory,
}

impl AppState {
    pub fn new(
        config: UpkeepConfig,
        users: UserStore,
        maintenance: MaintenanceStore,
        runs: RunHistory,
    ) -> Self {
        let tokens = TokenSigner::new(config.jwt_secret(), config.auth.token_ttl_hours);
        Self {
            config,
            users,
            maintenance,
            tokens,
            runs,
        }
    }
}

/// `Json` whose rejection is reported as `{"message": ...}` like every other error.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.server.cors_origin.as_deref());
    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/health/runs", get(http::health::runs_handler))
        .nest("/api/auth", http::auth::router())
        .nest("/api/categories", http::categories::router())
        .nest("/api/maintenance", http::maintenance::router())
        .nest("/api/maintenance-events", http::events::router())
        .nest("/api/reminders", http::reminders::router())
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!("invalid server.cors_origin, allowing any origin: {e}");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
