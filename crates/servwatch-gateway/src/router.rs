//! Axum router wiring.

use axum::{middleware, routing::get, Router};

use crate::{api::handlers, app_state::AppState, obs, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/servers", get(handlers::list_servers).post(handlers::create_server))
        .route(
            "/servers/:id",
            get(handlers::get_server)
                .put(handlers::update_server)
                .delete(handlers::delete_server),
        )
        .route("/predict_server_failure/:id", get(handlers::predict_server_failure))
        .route(
            "/generate_maintenance_schedule/:id",
            get(handlers::generate_maintenance_schedule),
        )
        .route("/server_history/:id", get(handlers::server_history))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), obs::track_requests))
        .with_state(state)
}
