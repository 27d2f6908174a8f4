//! # HTTP Push Transport
//!
//! Posts each reading as a URL-encoded form to the collector's `/sensor`
//! endpoint: `clientId=3&touch=1&batteryPercent=87.3`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use super::TelemetryTransport;
use crate::error::{Result, TelemetryError};
use crate::sampler::Reading;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Serialize)]
struct SensorForm<'a> {
    #[serde(rename = "clientId")]
    client_id: &'a str,
    touch: i32,
    #[serde(rename = "batteryPercent")]
    battery_percent: f32,
}

/// Form body for one reading
pub fn encode_form(reading: &Reading) -> Result<String> {
    let form = SensorForm {
        client_id: &reading.node_id,
        touch: reading.touch_value,
        battery_percent: reading.battery_percent,
    };

    serde_urlencoded::to_string(&form)
        .map_err(|e| TelemetryError::Transport(format!("Form encoding failed: {}", e)))
}

/// HTTP push strategy
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: Client,
    endpoint: String,
}

impl HttpPushTransport {
    /// Create a client for `endpoint` with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TelemetryTransport for HttpPushTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn deliver(&self, reading: &Reading) -> Result<()> {
        let body = encode_form(reading)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.endpoint, "HTTP Error: {}", e);
                e
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "HTTP Error code");
            return Err(TelemetryError::HttpStatus(status.as_u16()));
        }

        debug!(endpoint = %self.endpoint, "HTTP push accepted");
        Ok(())
    }
}
