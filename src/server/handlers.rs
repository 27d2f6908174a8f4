//! # HTTP Handlers
//!
//! Each handler works only on request data and the shared [`AppContext`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, RawQuery, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::params::{merge_params, requested_identity, sensor_reading};
use super::AppContext;
use crate::aggregation::serializer::{to_compact_text, to_json, to_local_json};
use crate::error::TelemetryError;

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";

/// `{"success":..,"message":..}` plus optional extra fields.
///
/// 200 on success, 400 otherwise.
pub fn status_response(success: bool, message: &str, extra: Option<(&str, Value)>) -> Response {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(success));
    body.insert("message".to_string(), Value::from(message));
    if let Some((key, value)) = extra {
        body.insert(key.to_string(), value);
    }

    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(Value::Object(body))).into_response()
}

/// `POST /sensor`: store a pushed reading under the caller's address
pub async fn post_sensor(
    State(ctx): State<Arc<AppContext>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    body: String,
) -> &'static str {
    let params = merge_params(query.as_deref(), &body);
    let reading = sensor_reading(&params);

    info!(
        source = %peer.ip(),
        "Received - ID: {}, Touch: {}, Battery: {:.1}%",
        reading.node_id,
        reading.touch_value,
        reading.battery_percent
    );

    ctx.store.upsert(&peer.ip().to_string(), reading);
    "OK"
}

/// `GET /sensorData`
pub async fn get_sensor_data(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
        to_json(&ctx.store.all()),
    )
}

/// `DELETE /sensorData`
pub async fn delete_sensor_data(State(ctx): State<Arc<AppContext>>) -> Response {
    ctx.store.clear();
    info!("Sensor data cleared");
    status_response(true, "Sensor data cleared", None)
}

/// `GET /sensorText`
pub async fn get_sensor_text(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        to_compact_text(&ctx.store.all(), ctx.min_slots),
    )
}

/// `GET /localSensorData`: a fresh reading from this node
pub async fn get_local_sensor_data(State(ctx): State<Arc<AppContext>>) -> Response {
    match ctx.sampler.read_blocking(ctx.identity.get()).await {
        Ok(reading) => (
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            to_local_json(&reading, &ctx.local_ip),
        )
            .into_response(),
        Err(e) => {
            warn!("Local sensor read failed: {}", e);
            let mut response = status_response(false, "Sensor read failed", None);
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

/// `POST /setClientId`: administrative identity override
pub async fn set_client_id(
    State(ctx): State<Arc<AppContext>>,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let params = merge_params(query.as_deref(), &body);

    let result = match requested_identity(&params) {
        Ok(value) => ctx.identity.set_blocking(value).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(id) => status_response(true, "Client ID updated", Some(("clientId", json!(id)))),
        Err(TelemetryError::MissingParameter(_)) => {
            status_response(false, "Missing ID parameter", None)
        }
        Err(e) => {
            warn!("Rejected client id: {}", e);
            status_response(false, "ID must be between 0-15", None)
        }
    }
}

/// `GET /getClientId`
pub async fn get_client_id(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    Json(json!({ "clientId": ctx.identity.get() }))
}
