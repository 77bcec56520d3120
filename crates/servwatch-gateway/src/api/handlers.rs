use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use servwatch_core::error::ServWatchError;
use servwatch_core::signals::{self, History};
use servwatch_core::{NewServer, Server, ServerId, ServerUpdate};

use crate::api::ApiError;
use crate::app_state::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct FailurePrediction {
    pub server_id: String,
    pub is_likely_to_fail: bool,
}

#[derive(Debug, Serialize)]
pub struct MaintenanceSchedule {
    pub server_id: String,
    pub maintenance_date: DateTime<Utc>,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ServWatchError::BadRequest(e.body_text()).into())
}

async fn fetch(app: &AppState, raw_id: &str) -> ApiResult<Server> {
    let id = ServerId::parse(raw_id)?;
    let store = app.store();
    Ok(app.bounded(store.get(&id)).await?)
}

// GET /servers
pub async fn list_servers(State(app): State<AppState>) -> ApiResult<Json<Vec<Server>>> {
    let store = app.store();
    Ok(Json(app.bounded(store.list()).await?))
}

// GET /servers/{id}
pub async fn get_server(State(app): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Server>> {
    Ok(Json(fetch(&app, &id).await?))
}

// POST /servers
pub async fn create_server(
    State(app): State<AppState>,
    payload: std::result::Result<Json<NewServer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let doc = body(payload)?;
    let store = app.store();
    let id = app.bounded(store.insert(doc)).await?;
    tracing::info!(%id, "server created");
    Ok((StatusCode::CREATED, Json(json!({ "_id": id.to_string() }))))
}

// PUT /servers/{id}
pub async fn update_server(
    State(app): State<AppState>,
    Path(raw_id): Path<String>,
    payload: std::result::Result<Json<ServerUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    const NOT_CHANGED: &str = "Server not found or no changes made";

    let id = ServerId::parse(&raw_id)?;
    let update = body(payload)?;

    let store = app.store();
    match app.bounded(store.update(&id, update)).await {
        Ok(true) => {
            tracing::info!(%id, "server updated");
            Ok(Json(json!({ "message": "Server updated successfully" })))
        }
        Ok(false) => Err(ApiError::from(ServWatchError::NotFound(format!("server {id} unchanged")))
            .with_message(NOT_CHANGED)),
        Err(e @ ServWatchError::NotFound(_)) => Err(ApiError::from(e).with_message(NOT_CHANGED)),
        Err(e) => Err(e.into()),
    }
}

// DELETE /servers/{id}
pub async fn delete_server(State(app): State<AppState>, Path(raw_id): Path<String>) -> ApiResult<Json<Value>> {
    let id = ServerId::parse(&raw_id)?;
    let store = app.store();
    app.bounded(store.delete(&id)).await?;
    tracing::info!(%id, "server deleted");
    Ok(Json(json!({ "message": "Server deleted successfully" })))
}

// GET /predict_server_failure/{id}
pub async fn predict_server_failure(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FailurePrediction>> {
    let server = fetch(&app, &id).await?;
    Ok(Json(FailurePrediction {
        server_id: server.id.to_string(),
        is_likely_to_fail: signals::predict_failure(&server.metrics),
    }))
}

// GET /generate_maintenance_schedule/{id}
pub async fn generate_maintenance_schedule(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MaintenanceSchedule>> {
    let server = fetch(&app, &id).await?;
    Ok(Json(MaintenanceSchedule {
        server_id: server.id.to_string(),
        maintenance_date: signals::generate_maintenance_schedule(app.clock()),
    }))
}

// GET /server_history/{id}
pub async fn server_history(State(app): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<History>> {
    let server = fetch(&app, &id).await?;
    let now = app.clock().now();
    let history = app.with_history_rng(|rng| signals::generate_history(&server.metrics, now, rng));
    Ok(Json(history))
}
