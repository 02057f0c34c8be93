//! Run configuration
//!
//! Every tunable of the model lives here: the calendar timezone, the weigh-in
//! convention, tissue energy densities, and the window selection policy. The
//! whole struct is (de)serializable so a run can be described by a JSON file;
//! every field has a default.

use crate::calendar::{day_key, CalendarPolicy};
use crate::error::BalanceError;
use crate::types::Metric;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default weekly bucket length in days
pub const DEFAULT_WEEK_LENGTH: usize = 7;

/// When the daily weigh-in happens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeighTime {
    /// Before the day's intake; one boundary day's intake is not reflected in
    /// the weight change
    #[default]
    Morning,
    /// After the day's intake; every window day counts
    Night,
}

/// Boundary day left out of the TDEE ledger for morning weigh-ins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryDay {
    First,
    #[default]
    Last,
}

/// Metric a day must have to stay in the window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryMetric {
    #[default]
    Intake,
    Weight,
}

/// Energy density of tissue change, kcal per kg
///
/// Building tissue costs more than losing it releases, so gains and losses use
/// separate constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyDensities {
    pub fat_store: f64,
    pub fat_build: f64,
    pub muscle_store: f64,
    pub muscle_build: f64,
}

impl Default for EnergyDensities {
    fn default() -> Self {
        Self {
            fat_store: 7700.0,
            fat_build: 8840.0,
            muscle_store: 1250.0,
            muscle_build: 5940.0,
        }
    }
}

impl EnergyDensities {
    /// kcal equivalent of a fat mass change
    pub fn fat_energy(&self, delta_kg: f64) -> f64 {
        directional(delta_kg, self.fat_build, self.fat_store)
    }

    /// kcal equivalent of a lean mass change
    pub fn lean_energy(&self, delta_kg: f64) -> f64 {
        directional(delta_kg, self.muscle_build, self.muscle_store)
    }
}

fn directional(delta_kg: f64, build: f64, store: f64) -> f64 {
    if delta_kg > 0.0 {
        delta_kg * build
    } else {
        delta_kg * store
    }
}

/// Analysis window selection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub primary: PrimaryMetric,
    /// Only count days with logged food
    pub require_intake_above_zero: bool,
    /// Boundary days must carry a body-fat reading
    pub require_body_fat: bool,
    #[serde(with = "day_key::option", skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(with = "day_key::option", skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            primary: PrimaryMetric::Intake,
            require_intake_above_zero: true,
            require_body_fat: true,
            from: None,
            to: None,
        }
    }
}

/// Data source identifier per metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceIds {
    pub weight: String,
    pub fat_percentage: String,
    pub nutrition: String,
    pub steps: String,
    pub heart_minutes: String,
    pub expended_calories: String,
    pub sleep: String,
}

impl Default for SourceIds {
    fn default() -> Self {
        Self {
            weight: Metric::Weight.default_source_id().to_string(),
            fat_percentage: Metric::FatPercentage.default_source_id().to_string(),
            nutrition: Metric::Nutrition.default_source_id().to_string(),
            steps: Metric::Steps.default_source_id().to_string(),
            heart_minutes: Metric::HeartMinutes.default_source_id().to_string(),
            expended_calories: Metric::ExpendedCalories.default_source_id().to_string(),
            sleep: Metric::Sleep.default_source_id().to_string(),
        }
    }
}

impl SourceIds {
    /// Every metric needs its own non-empty id; a shared id would make two
    /// metrics read the same dataset.
    pub fn validate(&self) -> Result<(), BalanceError> {
        let mut seen: BTreeMap<&str, Metric> = BTreeMap::new();
        for metric in Metric::ALL {
            let id = self.get(metric);
            if id.trim().is_empty() {
                return Err(BalanceError::InvalidConfig(format!(
                    "source id for {} is empty",
                    metric.as_str()
                )));
            }
            if let Some(other) = seen.insert(id, metric) {
                return Err(BalanceError::InvalidConfig(format!(
                    "source id {id} is shared by {} and {}",
                    other.as_str(),
                    metric.as_str()
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, metric: Metric) -> &str {
        match metric {
            Metric::Weight => &self.weight,
            Metric::FatPercentage => &self.fat_percentage,
            Metric::Nutrition => &self.nutrition,
            Metric::Steps => &self.steps,
            Metric::HeartMinutes => &self.heart_minutes,
            Metric::ExpendedCalories => &self.expended_calories,
            Metric::Sleep => &self.sleep,
        }
    }
}

/// Configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// IANA timezone deciding which calendar day a sample belongs to
    pub timezone: String,
    pub weigh_time: WeighTime,
    pub morning_excludes: BoundaryDay,
    pub densities: EnergyDensities,
    pub window: WindowConfig,
    pub week_length: usize,
    pub sources: SourceIds,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            weigh_time: WeighTime::Morning,
            morning_excludes: BoundaryDay::Last,
            densities: EnergyDensities::default(),
            window: WindowConfig::default(),
            week_length: DEFAULT_WEEK_LENGTH,
            sources: SourceIds::default(),
        }
    }
}

impl BalanceConfig {
    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, BalanceError> {
        let config: BalanceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, BalanceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), BalanceError> {
        let d = &self.densities;
        for (name, value) in [
            ("fat_store", d.fat_store),
            ("fat_build", d.fat_build),
            ("muscle_store", d.muscle_store),
            ("muscle_build", d.muscle_build),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BalanceError::InvalidConfig(format!(
                    "density {name} must be a positive number, got {value}"
                )));
            }
        }

        if self.week_length == 0 {
            return Err(BalanceError::InvalidConfig(
                "week_length must be at least 1".to_string(),
            ));
        }

        if let (Some(from), Some(to)) = (self.window.from, self.window.to) {
            if from > to {
                return Err(BalanceError::InvalidConfig(format!(
                    "window starts after it ends: {from} > {to}"
                )));
            }
        }

        self.sources.validate()?;
        self.calendar()?;
        Ok(())
    }

    pub fn calendar(&self) -> Result<CalendarPolicy, BalanceError> {
        CalendarPolicy::from_name(&self.timezone)
    }

    /// Boundary day excluded from the TDEE ledger, if any
    pub fn excluded_day(&self) -> Option<BoundaryDay> {
        match self.weigh_time {
            WeighTime::Morning => Some(self.morning_excludes),
            WeighTime::Night => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BalanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.excluded_day(), Some(BoundaryDay::Last));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "timezone": "Europe/Amsterdam",
            "weigh_time": "night",
            "densities": { "fat_build": 8500 },
            "window": { "primary": "weight", "from": "01/02/2024" }
        }"#;

        let config = BalanceConfig::from_json(json).unwrap();
        assert_eq!(config.weigh_time, WeighTime::Night);
        assert_eq!(config.excluded_day(), None);
        assert_eq!(config.densities.fat_build, 8500.0);
        assert_eq!(config.densities.fat_store, 7700.0);
        assert_eq!(config.window.primary, PrimaryMetric::Weight);
        assert!(config.window.require_intake_above_zero);
        assert_eq!(config.window.from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(config.week_length, DEFAULT_WEEK_LENGTH);
    }

    #[test]
    fn test_json_round_trip() {
        let config = BalanceConfig::default();
        let json = config.to_json().unwrap();
        let loaded = BalanceConfig::from_json(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = BalanceConfig::default();
        config.densities.muscle_store = 0.0;
        assert!(matches!(config.validate(), Err(BalanceError::InvalidConfig(_))));

        let mut config = BalanceConfig::default();
        config.week_length = 0;
        assert!(matches!(config.validate(), Err(BalanceError::InvalidConfig(_))));

        let mut config = BalanceConfig::default();
        config.timezone = "Nowhere/City".to_string();
        assert!(matches!(config.validate(), Err(BalanceError::InvalidTimezone(_))));
    }

    #[test]
    fn test_directional_densities() {
        let densities = EnergyDensities::default();
        assert_eq!(densities.fat_energy(1.0), 8840.0);
        assert_eq!(densities.fat_energy(-1.0), -7700.0);
        assert_eq!(densities.lean_energy(0.5), 2970.0);
        assert_eq!(densities.lean_energy(-0.04), -0.04 * 1250.0);
    }

    #[test]
    fn test_rejects_shared_or_empty_source_ids() {
        let mut config = BalanceConfig::default();
        config.sources.sleep = config.sources.steps.clone();
        assert!(matches!(
            config.validate(),
            Err(BalanceError::InvalidConfig(msg)) if msg.contains("steps") && msg.contains("sleep")
        ));

        let mut config = BalanceConfig::default();
        config.sources.nutrition = String::new();
        assert!(matches!(
            config.validate(),
            Err(BalanceError::InvalidConfig(_))
        ));
    }
}
