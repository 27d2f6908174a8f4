//! # Request Parameters
//!
//! Form fields may arrive in the query string, the URL-encoded body, or
//! both. Both are merged with body values taking precedence.
//!
//! Numeric fields are parsed leniently: a value that is not a number reads
//! as zero rather than rejecting the request.

use std::collections::HashMap;

use crate::error::{Result, TelemetryError};
use crate::sampler::Reading;

/// Merged request parameters
pub type Params = HashMap<String, String>;

/// Client id used when a pushed reading carries none
pub const DEFAULT_CLIENT_ID: &str = "0";

/// Merge query and body parameters; body wins
pub fn merge_params(query: Option<&str>, body: &str) -> Params {
    let mut params = Params::new();

    for source in [query.unwrap_or_default(), body] {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(source).unwrap_or_default();
        params.extend(pairs);
    }

    params
}

/// Integer field, 0 when missing or unparsable
pub fn lenient_i32(params: &Params, key: &str) -> i32 {
    let Some(raw) = params.get(key).map(|v| v.trim()) else {
        return 0;
    };

    if let Ok(value) = raw.parse::<i32>() {
        return value;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => value as i32,
        _ => 0,
    }
}

/// Float field, 0.0 when missing or unparsable
pub fn lenient_f32(params: &Params, key: &str) -> f32 {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Reading pushed to `/sensor`
pub fn sensor_reading(params: &Params) -> Reading {
    let client_id = params
        .get("clientId")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CLIENT_ID);

    Reading::new(
        client_id,
        lenient_i32(params, "touch"),
        lenient_f32(params, "batteryPercent"),
    )
}

/// Requested node identity from the `id` field.
///
/// Range checking is left to the identity assigner.
pub fn requested_identity(params: &Params) -> Result<i64> {
    let raw = params
        .get("id")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(TelemetryError::MissingParameter("id"))?;

    raw.parse::<i64>()
        .map_err(|_| TelemetryError::InvalidIdentity(format!("{:?} is not a number", raw)))
}
