//! Dataset sources
//!
//! The health-data API client lives outside this crate; it plugs in through
//! [`DatasetSource`]. [`DirectorySource`] serves datasets saved as JSON files,
//! one file per metric.

use crate::config::SourceIds;
use crate::error::BalanceError;
use crate::schema::{Dataset, DatasetAdapter};
use crate::types::Metric;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fetch collaborator returning one metric source's dataset for a time range
pub trait DatasetSource {
    /// Fetch points of `source_id` starting within `[start_nanos, end_nanos]`.
    ///
    /// Return [`BalanceError::MissingMetricData`] when the source has nothing;
    /// the pipeline treats that as an empty series.
    fn fetch(&self, source_id: &str, start_nanos: i64, end_nanos: i64)
        -> Result<Dataset, BalanceError>;
}

/// Datasets stored as `<dir>/<metric>.json`
pub struct DirectorySource {
    files: HashMap<String, PathBuf>,
}

impl DirectorySource {
    /// Map every configured source id to its metric's file in `dir`
    pub fn new(dir: &Path, sources: &SourceIds) -> Self {
        let files = Metric::ALL
            .iter()
            .map(|metric| {
                (
                    sources.get(*metric).to_string(),
                    dir.join(format!("{}.json", metric.as_str())),
                )
            })
            .collect();
        Self { files }
    }
}

impl DatasetSource for DirectorySource {
    fn fetch(
        &self,
        source_id: &str,
        start_nanos: i64,
        end_nanos: i64,
    ) -> Result<Dataset, BalanceError> {
        let path = self
            .files
            .get(source_id)
            .ok_or_else(|| BalanceError::MissingMetricData(source_id.to_string()))?;

        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BalanceError::MissingMetricData(format!(
                    "{source_id} ({})",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let dataset = DatasetAdapter::parse(&json)?;
        Ok(dataset.restricted_to(start_nanos, end_nanos))
    }
}
