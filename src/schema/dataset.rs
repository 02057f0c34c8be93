//! Dataset payload definition
//!
//! Mirrors the JSON returned by a `datasets.get` call of the health-data API:
//! a list of points, each carrying nanosecond timestamps and a list of typed
//! values (`fpVal`, `intVal`, `strVal`, or a `mapVal` of named sub-values).

use serde::{Deserialize, Deserializer, Serialize};

/// One metric's time series for a requested range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "nanos_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_start_time_ns: Option<i64>,
    #[serde(
        default,
        deserialize_with = "nanos_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_end_time_ns: Option<i64>,
    /// Absent when the source has nothing for the range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<Vec<DataPoint>>,
}

impl Dataset {
    /// Dataset holding the given points
    pub fn with_points(points: Vec<DataPoint>) -> Self {
        Self {
            point: Some(points),
            ..Default::default()
        }
    }

    /// Copy keeping only points starting inside `[start_nanos, end_nanos]`.
    ///
    /// Points whose start time cannot be parsed are kept so the adapter can
    /// report them.
    pub fn restricted_to(&self, start_nanos: i64, end_nanos: i64) -> Dataset {
        let point = self.point.as_ref().map(|points| {
            points
                .iter()
                .filter(|p| {
                    p.start_nanos()
                        .map_or(true, |t| t >= start_nanos && t <= end_nanos)
                })
                .cloned()
                .collect()
        });

        Dataset {
            data_source_id: self.data_source_id.clone(),
            min_start_time_ns: Some(start_nanos),
            max_end_time_ns: Some(end_nanos),
            point,
        }
    }
}

/// A single data point
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    /// Nanoseconds since epoch, sent by the API as a decimal string
    pub start_time_nanos: NanosField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_nanos: Option<NanosField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_data_source_id: Option<String>,
    #[serde(default)]
    pub value: Vec<Value>,
}

impl DataPoint {
    pub fn start_nanos(&self) -> Option<i64> {
        self.start_time_nanos.as_i64()
    }

    pub fn end_nanos(&self) -> Option<i64> {
        self.end_time_nanos.as_ref().and_then(NanosField::as_i64)
    }
}

/// Nanosecond timestamp as either a JSON string or a JSON number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NanosField {
    Number(i64),
    Text(String),
}

impl NanosField {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NanosField::Number(n) => Some(*n),
            NanosField::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for NanosField {
    fn from(nanos: i64) -> Self {
        NanosField::Text(nanos.to_string())
    }
}

/// Typed value of a data point field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp_val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_val: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub str_val: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_val: Option<Vec<MapEntry>>,
}

/// Named sub-value of a composite field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapEntry {
    pub key: String,
    #[serde(default)]
    pub value: MapValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp_val: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_val: Option<i64>,
}

impl MapValue {
    pub fn as_f64(&self) -> Option<f64> {
        self.fp_val.or(self.int_val.map(|v| v as f64))
    }
}

fn nanos_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let field: Option<NanosField> = Option::deserialize(deserializer)?;
    Ok(field.and_then(|f| f.as_i64()))
}
