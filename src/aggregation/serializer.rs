//! # Serializer
//!
//! Renders readings for the reporting surfaces.
//!
//! ## JSON
//!
//! The aggregated table renders as an object keyed by source address:
//!
//! ```text
//! {"10.0.0.5":{"clientId":"3","touch":1,"batteryPercent":87.3}}
//! ```
//!
//! The local reading renders flat, with the node's own address:
//!
//! ```text
//! {"ip":"10.0.0.7","clientId":3,"touch":1,"batteryPercent":87.3}
//! ```
//!
//! ## Compact Text
//!
//! Fixed-width line for small displays: `TP:` followed by one
//! `touch,battery` pair per entry, padded with `0,0.0` up to a minimum
//! number of slots.
//!
//! ```
//! use touch_telemetry::aggregation::{AggregationStore, serializer::to_compact_text};
//! use touch_telemetry::sampler::Reading;
//!
//! let store = AggregationStore::new();
//! store.upsert("10.0.0.5", Reading::new("3", 1, 87.3));
//! assert_eq!(to_compact_text(&store.all(), 3), "TP:1,87.3,0,0.0,0,0.0");
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::store::AggregationTable;
use crate::sampler::Reading;

/// Placeholder pair used to pad the compact text
pub const EMPTY_SLOT: &str = "0,0.0";

/// Compact text prefix
pub const COMPACT_PREFIX: &str = "TP:";

/// Battery percentage rounded to one decimal digit
pub fn one_decimal(value: f32) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(0.0)
}

fn serialize_one_decimal<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(one_decimal(*value))
}

#[derive(Serialize)]
struct EntryView<'a> {
    #[serde(rename = "clientId")]
    client_id: &'a str,
    touch: i32,
    #[serde(rename = "batteryPercent", serialize_with = "serialize_one_decimal")]
    battery_percent: f32,
}

#[derive(Serialize)]
struct LocalView<'a> {
    ip: &'a str,
    #[serde(rename = "clientId")]
    client_id: Value,
    touch: i32,
    #[serde(rename = "batteryPercent", serialize_with = "serialize_one_decimal")]
    battery_percent: f32,
}

/// JSON object of the whole table, keys in table order
pub fn to_json(table: &AggregationTable) -> String {
    let view: BTreeMap<&str, EntryView<'_>> = table
        .iter()
        .map(|(key, entry)| {
            (
                key.as_str(),
                EntryView {
                    client_id: &entry.reading.node_id,
                    touch: entry.reading.touch_value,
                    battery_percent: entry.reading.battery_percent,
                },
            )
        })
        .collect();

    serde_json::to_string(&view).unwrap_or_else(|_| String::from("{}"))
}

/// Flat JSON object for this node's own reading.
///
/// `clientId` is rendered as a number when the node id is numeric.
pub fn to_local_json(reading: &Reading, ip: &str) -> String {
    let client_id = reading
        .node_id
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(reading.node_id.as_str()));

    let view = LocalView {
        ip,
        client_id,
        touch: reading.touch_value,
        battery_percent: reading.battery_percent,
    };

    serde_json::to_string(&view).unwrap_or_else(|_| String::from("{}"))
}

/// Compact `TP:` line with at least `min_slots` pairs
pub fn to_compact_text(table: &AggregationTable, min_slots: usize) -> String {
    let mut pairs: Vec<String> = table
        .values()
        .map(|entry| {
            let mut pair = String::new();
            let _ = write!(
                pair,
                "{},{:.1}",
                entry.reading.touch_value, entry.reading.battery_percent
            );
            pair
        })
        .collect();

    while pairs.len() < min_slots {
        pairs.push(EMPTY_SLOT.to_string());
    }

    format!("{}{}", COMPACT_PREFIX, pairs.join(","))
}
