//! # HTTP Server Module
//!
//! Reporting and control surface of a collector node.
//!
//! Routes are registered once at startup:
//!
//! | Method | Path               | Handler                 |
//! |--------|--------------------|-------------------------|
//! | POST   | `/sensor`          | store a pushed reading  |
//! | GET    | `/sensorData`      | aggregated JSON         |
//! | DELETE | `/sensorData`      | clear the table         |
//! | GET    | `/sensorText`      | compact text line       |
//! | GET    | `/localSensorData` | this node's reading     |
//! | POST   | `/setClientId`     | identity override       |
//! | GET    | `/getClientId`     | current identity        |

pub mod handlers;
pub mod params;

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::aggregation::AggregationStore;
use crate::error::Result;
use crate::identity::IdentityAssigner;
use crate::sampler::TelemetrySampler;

/// Shared components handed to every handler
#[derive(Debug)]
pub struct AppContext {
    pub store: Arc<AggregationStore>,
    pub identity: Arc<IdentityAssigner>,
    pub sampler: Arc<TelemetrySampler>,
    /// Reported as `ip` in the local reading
    pub local_ip: String,
    /// Minimum pair count of the compact text line
    pub min_slots: usize,
}

/// Address this node reports as `ip` in its local reading.
///
/// An explicit `advertise_ip` wins, then a concrete bind address. For a
/// wildcard bind the outbound interface towards `route_address` is used:
/// connecting a UDP socket selects a route without sending anything.
pub fn local_ip(bound: SocketAddr, advertise_ip: Option<&str>, route_address: &str) -> String {
    if let Some(ip) = advertise_ip {
        return ip.to_string();
    }
    if !bound.ip().is_unspecified() {
        return bound.ip().to_string();
    }

    match outbound_ip(route_address) {
        Ok(ip) if !ip.is_unspecified() => ip.to_string(),
        Ok(_) => loopback_fallback(route_address, "no route"),
        Err(e) => loopback_fallback(route_address, &e.to_string()),
    }
}

fn outbound_ip(route_address: &str) -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(route_address)?;
    Ok(socket.local_addr()?.ip())
}

fn loopback_fallback(route_address: &str, reason: &str) -> String {
    warn!(route_address, "No outbound interface found ({}), reporting loopback", reason);
    Ipv4Addr::LOCALHOST.to_string()
}

/// Build the route table
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/sensor", post(handlers::post_sensor))
        .route(
            "/sensorData",
            get(handlers::get_sensor_data).delete(handlers::delete_sensor_data),
        )
        .route("/sensorText", get(handlers::get_sensor_text))
        .route("/localSensorData", get(handlers::get_local_sensor_data))
        .route("/setClientId", post(handlers::set_client_id))
        .route("/getClientId", get(handlers::get_client_id))
        .with_state(ctx)
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, ctx: Arc<AppContext>) -> Result<()> {
    info!(address = ?listener.local_addr().ok(), "HTTP server listening");

    let app = router(ctx).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await?;
    Ok(())
}
