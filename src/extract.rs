//! Sample extraction
//!
//! Converts one metric's raw samples into dated records:
//! - Scalar metrics keep their float/integer payload
//! - Nutrition picks the named nutrients out of the payload map
//! - Sleep maps the stage code and converts the segment span to hours

use crate::calendar::CalendarPolicy;
use crate::error::BalanceError;
use crate::types::{
    Metric, NutritionFacts, RawSample, Reading, SampleRecord, SampleValue, SleepStage,
};
use std::collections::BTreeMap;

/// Nanoseconds in one hour
const NANOS_PER_HOUR: f64 = 3.6e12;

/// Nutrient keys of the nutrition payload map
pub const KEY_CALORIES: &str = "calories";
pub const KEY_PROTEIN: &str = "protein";
pub const KEY_FAT: &str = "fat.total";
pub const KEY_CARBS: &str = "carbs.total";
pub const KEY_FIBER: &str = "dietary_fiber";
pub const KEY_SUGAR: &str = "sugar";
pub const KEY_SATURATED_FAT: &str = "fat.saturated";
pub const KEY_UNSATURATED_FAT: &str = "fat.unsaturated";

/// Extractor turning raw samples of one metric into dated records
pub struct SampleExtractor<'a> {
    calendar: &'a CalendarPolicy,
}

impl<'a> SampleExtractor<'a> {
    pub fn new(calendar: &'a CalendarPolicy) -> Self {
        Self { calendar }
    }

    /// Extract dated records from a metric's samples.
    ///
    /// Samples whose payload does not fit the metric are skipped. An unknown
    /// sleep stage code fails the extraction.
    pub fn extract(
        &self,
        metric: Metric,
        samples: &[RawSample],
    ) -> Result<Vec<SampleRecord>, BalanceError> {
        let mut records = Vec::with_capacity(samples.len());

        for sample in samples {
            let reading = match metric {
                Metric::Nutrition => extract_nutrition(sample),
                Metric::Sleep => extract_sleep(sample)?,
                _ => sample.value.as_f64().map(Reading::Scalar),
            };

            let Some(reading) = reading else {
                tracing::warn!(
                    metric = metric.as_str(),
                    start_time_nanos = sample.start_time_nanos,
                    "sample payload does not match metric, skipping"
                );
                continue;
            };

            records.push(SampleRecord {
                date: self.calendar.date_of_nanos(sample.start_time_nanos)?,
                timestamp_nanos: sample.start_time_nanos,
                reading,
            });
        }

        tracing::debug!(metric = metric.as_str(), records = records.len(), "extracted");
        Ok(records)
    }
}

fn extract_nutrition(sample: &RawSample) -> Option<Reading> {
    let SampleValue::Map(fields) = &sample.value else {
        return None;
    };

    Some(Reading::Nutrition {
        facts: nutrition_facts(fields),
        food: sample.label.clone(),
    })
}

/// Nutrients from a payload map, missing keys read as zero
pub fn nutrition_facts(fields: &BTreeMap<String, f64>) -> NutritionFacts {
    let get = |key: &str| fields.get(key).copied().unwrap_or(0.0);

    NutritionFacts {
        calories: get(KEY_CALORIES),
        protein: get(KEY_PROTEIN),
        fat: get(KEY_FAT),
        carbs: get(KEY_CARBS),
        fiber: get(KEY_FIBER),
        sugar: get(KEY_SUGAR),
        saturated_fat: get(KEY_SATURATED_FAT),
        unsaturated_fat: get(KEY_UNSATURATED_FAT),
    }
}

fn extract_sleep(sample: &RawSample) -> Result<Option<Reading>, BalanceError> {
    let code = match sample.value {
        SampleValue::Int(code) => code,
        SampleValue::Float(code) if code.fract() == 0.0 => code as i64,
        _ => return Ok(None),
    };
    let stage = SleepStage::from_code(code).ok_or(BalanceError::UnknownSleepStage(code))?;

    let span = sample
        .end_time_nanos
        .map_or(0, |end| end.saturating_sub(sample.start_time_nanos).max(0));

    Ok(Some(Reading::Sleep {
        stage,
        hours: round2(span as f64 / NANOS_PER_HOUR),
    }))
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
