//! Core types for the Energy Balance pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw samples, dated records, daily tables, merged days, and the
//! statistics report.

use crate::calendar::day_key;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

/// Health metric tracked by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    FatPercentage,
    Nutrition,
    Steps,
    HeartMinutes,
    ExpendedCalories,
    Sleep,
}

/// How same-day values of a metric are folded together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Add every value of the day
    Sum,
    /// Keep the chronologically last value of the day
    Last,
}

impl Metric {
    /// All metrics, weight first (its range bounds every other fetch)
    pub const ALL: [Metric; 7] = [
        Metric::Weight,
        Metric::FatPercentage,
        Metric::Nutrition,
        Metric::Steps,
        Metric::HeartMinutes,
        Metric::ExpendedCalories,
        Metric::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Weight => "weight",
            Metric::FatPercentage => "fat_percentage",
            Metric::Nutrition => "nutrition",
            Metric::Steps => "steps",
            Metric::HeartMinutes => "heart_minutes",
            Metric::ExpendedCalories => "expended_calories",
            Metric::Sleep => "sleep",
        }
    }

    pub fn reduction(&self) -> Reduction {
        match self {
            Metric::Weight | Metric::FatPercentage => Reduction::Last,
            _ => Reduction::Sum,
        }
    }

    /// Google Fit merged data source for this metric
    pub fn default_source_id(&self) -> &'static str {
        match self {
            Metric::Weight => "derived:com.google.weight:com.google.android.gms:merge_weight",
            Metric::FatPercentage => {
                "derived:com.google.body.fat.percentage:com.google.android.gms:merged"
            }
            Metric::Nutrition => "derived:com.google.nutrition:com.google.android.gms:merged",
            Metric::Steps => {
                "derived:com.google.step_count.delta:com.google.android.gms:estimated_steps"
            }
            Metric::HeartMinutes => {
                "derived:com.google.heart_minutes:com.google.android.gms:merge_heart_minutes"
            }
            Metric::ExpendedCalories => {
                "derived:com.google.calories.expended:com.google.android.gms:merge_calories_expended"
            }
            Metric::Sleep => "derived:com.google.sleep.segment:com.google.android.gms:merged",
        }
    }
}

/// Payload of a single raw sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleValue {
    Float(f64),
    Int(i64),
    /// Named sub-values of a composite metric (nutrition)
    Map(BTreeMap<String, f64>),
}

impl SampleValue {
    /// Scalar payload as `f64`, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Float(v) => Some(*v),
            SampleValue::Int(v) => Some(*v as f64),
            SampleValue::Map(_) => None,
        }
    }
}

/// One point from the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Nanoseconds since epoch; defines the sample's calendar day
    pub start_time_nanos: i64,
    /// End of the sample for duration metrics (sleep segments)
    pub end_time_nanos: Option<i64>,
    pub value: SampleValue,
    /// Food name for nutrition entries
    pub label: Option<String>,
}

/// Nutrition values of one entry or one day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub saturated_fat: f64,
    pub unsaturated_fat: f64,
}

impl AddAssign for NutritionFacts {
    fn add_assign(&mut self, other: Self) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.fat += other.fat;
        self.carbs += other.carbs;
        self.fiber += other.fiber;
        self.sugar += other.sugar;
        self.saturated_fat += other.saturated_fat;
        self.unsaturated_fat += other.unsaturated_fat;
    }
}

impl NutritionFacts {
    /// Every field divided by `count`
    pub fn divided_by(&self, count: f64) -> Self {
        Self {
            calories: self.calories / count,
            protein: self.protein / count,
            fat: self.fat / count,
            carbs: self.carbs / count,
            fiber: self.fiber / count,
            sugar: self.sugar / count,
            saturated_fat: self.saturated_fat / count,
            unsaturated_fat: self.unsaturated_fat / count,
        }
    }
}

/// Sleep segment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SleepStage {
    #[serde(rename = "Awake")]
    Awake,
    #[serde(rename = "Sleep")]
    Sleep,
    #[serde(rename = "Out-of-bed")]
    OutOfBed,
    #[serde(rename = "Light sleep")]
    Light,
    #[serde(rename = "Deep sleep")]
    Deep,
    #[serde(rename = "REM sleep")]
    Rem,
}

impl SleepStage {
    /// Map a Google Fit sleep segment code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(SleepStage::Awake),
            2 => Some(SleepStage::Sleep),
            3 => Some(SleepStage::OutOfBed),
            4 => Some(SleepStage::Light),
            5 => Some(SleepStage::Deep),
            6 => Some(SleepStage::Rem),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SleepStage::Awake => "Awake",
            SleepStage::Sleep => "Sleep",
            SleepStage::OutOfBed => "Out-of-bed",
            SleepStage::Light => "Light sleep",
            SleepStage::Deep => "Deep sleep",
            SleepStage::Rem => "REM sleep",
        }
    }

    /// Whether time in this stage counts as sleep
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepStage::Awake | SleepStage::OutOfBed)
    }
}

/// Metric-specific content of an extracted record
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Scalar(f64),
    Nutrition {
        facts: NutritionFacts,
        food: Option<String>,
    },
    Sleep {
        stage: SleepStage,
        hours: f64,
    },
}

/// A raw sample resolved to its calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub date: NaiveDate,
    pub timestamp_nanos: i64,
    pub reading: Reading,
}

/// Nutrition of one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionDay {
    pub facts: NutritionFacts,
    /// Food labels in logging order; the same food may appear more than once
    pub foods: Vec<String>,
    /// Number of logged entries
    pub entries: u32,
}

/// Sleep of one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepDay {
    /// Hours over every segment of the day
    pub hours: f64,
    /// Hours spent in sleeping stages
    pub asleep_hours: f64,
    pub stages: BTreeSet<SleepStage>,
    pub stage_hours: BTreeMap<SleepStage, f64>,
}

/// Aggregated value of one metric on one day
#[derive(Debug, Clone, PartialEq)]
pub enum DailyValue {
    Scalar(f64),
    Nutrition(NutritionDay),
    Sleep(SleepDay),
}

/// One metric folded to one value per day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTable {
    pub metric: Metric,
    pub rows: BTreeMap<NaiveDate, DailyValue>,
}

impl DailyTable {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            rows: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every metric of one calendar day. `None` means the metric was not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedDay {
    #[serde(with = "day_key")]
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expended_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<SleepDay>,
}

impl MergedDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weight: None,
            fat_percentage: None,
            nutrition: None,
            steps: None,
            heart_minutes: None,
            expended_calories: None,
            sleep: None,
        }
    }

    /// Intake calories, if any food was logged
    pub fn intake_calories(&self) -> Option<f64> {
        self.nutrition.as_ref().map(|n| n.facts.calories)
    }

    /// Logged intake with more than zero calories
    pub fn has_intake(&self) -> bool {
        self.intake_calories().is_some_and(|c| c > 0.0)
    }
}

/// Contiguous ordered days selected for statistics (at least two)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisWindow {
    pub days: Vec<MergedDay>,
}

impl AnalysisWindow {
    pub fn first(&self) -> Option<&MergedDay> {
        self.days.first()
    }

    pub fn last(&self) -> Option<&MergedDay> {
        self.days.last()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub producer: String,
    pub version: String,
    pub run_id: String,
    pub computed_at_utc: String,
    pub timezone: String,
}

/// Sums over the analysis window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub intake: NutritionFacts,
    pub steps: f64,
    pub heart_minutes: f64,
    pub expended_calories: f64,
    pub sleep_hours: f64,
}

/// Per-day averages over the days that report each field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub intake: NutritionFacts,
    pub weight: f64,
    pub fat_percentage: Option<f64>,
    pub steps: Option<f64>,
    pub heart_minutes: Option<f64>,
    pub expended_calories: Option<f64>,
    pub sleep_hours: Option<f64>,
}

/// Body composition change between the first and last window day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionChange {
    pub start_weight: f64,
    pub end_weight: f64,
    pub weight_delta: f64,
    pub start_fat_percentage: f64,
    pub end_fat_percentage: f64,
    pub fat_percentage_delta: f64,
    pub start_fat_mass: f64,
    pub end_fat_mass: f64,
    pub fat_delta: f64,
    pub start_lean_mass: f64,
    pub end_lean_mass: f64,
    pub lean_delta: f64,
    /// kcal stored (+) or released (-) as fat
    pub fat_energy: f64,
    /// kcal stored (+) or released (-) as lean mass
    pub lean_energy: f64,
    pub stored_energy: f64,
    /// Intake of the days counted towards TDEE
    pub intake_counted: f64,
    pub days_counted: usize,
    pub tdee: f64,
}

/// Averages of one weekly bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub index: usize,
    #[serde(with = "day_key")]
    pub start: NaiveDate,
    #[serde(with = "day_key")]
    pub end: NaiveDate,
    pub days: usize,
    pub avg_weight: Option<f64>,
    pub avg_fat_percentage: Option<f64>,
    pub avg_intake_calories: Option<f64>,
}

/// Complete statistics of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub meta: ReportMeta,
    #[serde(with = "day_key")]
    pub start: NaiveDate,
    #[serde(with = "day_key")]
    pub end: NaiveDate,
    pub days: usize,
    pub totals: Totals,
    pub averages: Averages,
    pub composition: CompositionChange,
    pub weeks: Vec<WeeklySummary>,
}
