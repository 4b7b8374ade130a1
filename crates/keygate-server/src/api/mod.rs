use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod access;
mod devices;
mod error;
mod logs;
pub mod origin;
mod system;
mod types;
mod users;

pub use error::ApiError;
pub use origin::OriginAddress;
pub use types::*;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/status", get(system::get_status))
        .route("/access", post(access::verify_access))
        .route("/access/verify", post(access::verify_access))
        .route("/devices", get(devices::list_devices))
        .route("/devices", post(devices::create_device))
        .route("/devices/{id}", delete(devices::delete_device))
        .route("/devices/{id}/address", put(devices::update_device_address))
        .route("/devices/{id}/active", put(devices::set_device_active))
        .route("/devices/{id}/config", get(devices::get_device_config))
        .route("/devices/{id}/config", put(devices::update_device_config))
        .route("/config", get(system::get_config))
        .route("/config", put(system::update_config))
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        .route("/users/{id}/active", put(users::set_user_active))
        .route("/logs", get(logs::list_logs))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
