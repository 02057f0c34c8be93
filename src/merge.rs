//! Record merging
//!
//! Outer-joins the per-metric daily tables on date. A table only ever sets the
//! field of its own metric, so a metric missing on a day stays `None`.

use crate::types::{DailyTable, DailyValue, MergedDay, Metric};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Merger joining daily tables into one row per date
pub struct RecordMerger;

impl RecordMerger {
    /// Merge tables in the given order into rows sorted by date.
    ///
    /// When two tables carry the same metric, the later one wins on dates it
    /// provides; dates it does not provide keep the earlier value.
    pub fn merge(tables: &[DailyTable]) -> Vec<MergedDay> {
        let mut by_date: BTreeMap<NaiveDate, MergedDay> = BTreeMap::new();

        for table in tables {
            for (date, value) in &table.rows {
                let day = by_date
                    .entry(*date)
                    .or_insert_with(|| MergedDay::new(*date));
                apply(day, table.metric, value);
            }
        }

        tracing::debug!(tables = tables.len(), days = by_date.len(), "merged");
        by_date.into_values().collect()
    }
}

fn apply(day: &mut MergedDay, metric: Metric, value: &DailyValue) {
    match (metric, value) {
        (Metric::Weight, DailyValue::Scalar(v)) => day.weight = Some(*v),
        (Metric::FatPercentage, DailyValue::Scalar(v)) => day.fat_percentage = Some(*v),
        (Metric::Steps, DailyValue::Scalar(v)) => day.steps = Some(*v),
        (Metric::HeartMinutes, DailyValue::Scalar(v)) => day.heart_minutes = Some(*v),
        (Metric::ExpendedCalories, DailyValue::Scalar(v)) => day.expended_calories = Some(*v),
        (Metric::Nutrition, DailyValue::Nutrition(n)) => day.nutrition = Some(n.clone()),
        (Metric::Sleep, DailyValue::Sleep(s)) => day.sleep = Some(s.clone()),
        (metric, value) => {
            tracing::warn!(
                metric = metric.as_str(),
                ?value,
                "daily value does not match metric, ignored"
            );
        }
    }
}
