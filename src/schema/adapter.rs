//! Adapter for converting datasets to raw samples
//!
//! Resolves each data point's timestamps and picks its payload: a map of named
//! sub-values when present, otherwise the first float or integer value. String
//! values become the sample label.

use crate::error::BalanceError;
use crate::schema::dataset::{DataPoint, Dataset};
use crate::types::{RawSample, SampleValue};
use std::collections::BTreeMap;

/// Adapter for converting datasets to raw samples
pub struct DatasetAdapter;

impl DatasetAdapter {
    /// Parse a dataset JSON document
    pub fn parse(json: &str) -> Result<Dataset, BalanceError> {
        let dataset: Dataset = serde_json::from_str(json)?;
        Ok(dataset)
    }

    /// Convert a dataset's points into raw samples, ordered by start time.
    ///
    /// A dataset without a point list yields no samples. Points without a usable
    /// timestamp or payload are skipped.
    pub fn to_samples(dataset: &Dataset) -> Vec<RawSample> {
        let Some(points) = dataset.point.as_ref() else {
            tracing::warn!(
                source = dataset.data_source_id.as_deref().unwrap_or("unknown"),
                "dataset has no point list, treating as empty"
            );
            return Vec::new();
        };

        let mut samples: Vec<RawSample> = points
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                let sample = point_to_sample(point);
                if sample.is_none() {
                    tracing::warn!(index, "skipping malformed data point");
                }
                sample
            })
            .collect();

        samples.sort_by_key(|s| s.start_time_nanos);
        samples
    }
}

fn point_to_sample(point: &DataPoint) -> Option<RawSample> {
    let start_time_nanos = point.start_nanos()?;

    let map = point
        .value
        .iter()
        .find_map(|v| v.map_val.as_ref().filter(|m| !m.is_empty()));
    let value = if let Some(entries) = map {
        let fields: BTreeMap<String, f64> = entries
            .iter()
            .filter_map(|e| e.value.as_f64().map(|v| (e.key.clone(), v)))
            .collect();
        SampleValue::Map(fields)
    } else if let Some(fp) = point.value.iter().find_map(|v| v.fp_val) {
        SampleValue::Float(fp)
    } else {
        SampleValue::Int(point.value.iter().find_map(|v| v.int_val)?)
    };

    let label = point
        .value
        .iter()
        .find_map(|v| v.str_val.as_ref())
        .filter(|s| !s.is_empty())
        .cloned();

    Some(RawSample {
        start_time_nanos,
        end_time_nanos: point.end_nanos(),
        value,
        label,
    })
}
