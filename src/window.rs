//! Analysis window selection
//!
//! Narrows the merged days to the contiguous range worth analysing:
//! 1. Clip to the configured from/to dates and sort by date
//! 2. Drop days lacking the primary metric (and, by policy, days without food)
//! 3. Trim trailing days without calorie data
//! 4. Trim both ends until the boundary days carry weight, body fat and intake

use crate::config::{PrimaryMetric, WindowConfig};
use crate::error::BalanceError;
use crate::types::{AnalysisWindow, MergedDay};

/// Minimum number of days needed to compute deltas
pub const MIN_WINDOW_DAYS: usize = 2;

/// Selector for the analysis window
pub struct RangeSelector<'a> {
    config: &'a WindowConfig,
}

impl<'a> RangeSelector<'a> {
    pub fn new(config: &'a WindowConfig) -> Self {
        Self { config }
    }

    pub fn select(&self, days: &[MergedDay]) -> Result<AnalysisWindow, BalanceError> {
        let mut selected: Vec<MergedDay> = days
            .iter()
            .filter(|d| self.config.from.map_or(true, |from| d.date >= from))
            .filter(|d| self.config.to.map_or(true, |to| d.date <= to))
            .filter(|d| self.keeps(d))
            .cloned()
            .collect();
        selected.sort_by_key(|d| d.date);

        // A day added after the last food log does not count
        while selected.last().is_some_and(|d| d.intake_calories().is_none()) {
            selected.pop();
        }

        let Some(start) = selected.iter().position(|d| self.is_boundary(d)) else {
            return Err(BalanceError::InsufficientWindow { available: 0 });
        };
        let end = selected
            .iter()
            .rposition(|d| self.is_boundary(d))
            .unwrap_or(start);

        let window: Vec<MergedDay> = selected.drain(start..=end).collect();
        if window.len() < MIN_WINDOW_DAYS {
            return Err(BalanceError::InsufficientWindow {
                available: window.len(),
            });
        }

        let window = AnalysisWindow { days: window };
        if let (Some(first), Some(last)) = (window.first(), window.last()) {
            tracing::info!(
                first = %first.date,
                last = %last.date,
                days = window.len(),
                "selected analysis window"
            );
        }
        Ok(window)
    }

    fn keeps(&self, day: &MergedDay) -> bool {
        let has_primary = match self.config.primary {
            PrimaryMetric::Intake => day.intake_calories().is_some(),
            PrimaryMetric::Weight => day.weight.is_some(),
        };
        has_primary && (!self.config.require_intake_above_zero || day.has_intake())
    }

    /// A day that can open or close the window
    fn is_boundary(&self, day: &MergedDay) -> bool {
        day.weight.is_some()
            && (!self.config.require_body_fat || day.fat_percentage.is_some())
            && day.has_intake()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NutritionDay, NutritionFacts};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn day(d: u32, weight: Option<f64>, fat: Option<f64>, calories: Option<f64>) -> MergedDay {
        let mut day = MergedDay::new(date(d));
        day.weight = weight;
        day.fat_percentage = fat;
        day.nutrition = calories.map(|calories| NutritionDay {
            facts: NutritionFacts {
                calories,
                ..Default::default()
            },
            foods: Vec::new(),
            entries: 1,
        });
        day
    }

    fn dates(window: &AnalysisWindow) -> Vec<NaiveDate> {
        window.days.iter().map(|d| d.date).collect()
    }

    #[test]
    fn test_leading_weightless_run_dropped() {
        let days = vec![
            day(1, None, None, Some(2000.0)),
            day(2, None, None, Some(2100.0)),
            day(3, Some(80.0), Some(20.0), Some(1900.0)),
            day(4, None, None, Some(2200.0)),
            day(5, Some(79.6), Some(19.8), Some(2000.0)),
        ];

        let config = WindowConfig::default();
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(3), date(4), date(5)]);
        // the inner weightless day is kept as-is, not zero-filled
        assert_eq!(window.days[1].weight, None);
    }

    #[test]
    fn test_days_without_food_are_excluded() {
        let days = vec![
            day(1, Some(80.0), Some(20.0), Some(2000.0)),
            day(2, Some(79.9), Some(20.0), Some(0.0)),
            day(3, Some(79.8), Some(20.0), None),
            day(4, Some(79.7), Some(19.9), Some(1800.0)),
        ];

        let config = WindowConfig::default();
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(1), date(4)]);
    }

    #[test]
    fn test_trailing_days_without_calories_trimmed() {
        let days = vec![
            day(1, Some(80.0), Some(20.0), Some(2000.0)),
            day(2, Some(79.9), Some(19.9), Some(2100.0)),
            day(3, Some(79.8), Some(19.8), None),
            day(4, Some(79.7), Some(19.7), None),
        ];

        let config = WindowConfig {
            primary: PrimaryMetric::Weight,
            require_intake_above_zero: false,
            ..Default::default()
        };
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(1), date(2)]);
    }

    #[test]
    fn test_weight_primary_drops_weightless_days() {
        let days = vec![
            day(1, Some(80.0), Some(20.0), Some(2000.0)),
            day(2, None, None, Some(2500.0)),
            day(3, Some(79.5), Some(19.5), Some(2100.0)),
        ];

        let config = WindowConfig {
            primary: PrimaryMetric::Weight,
            ..Default::default()
        };
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(1), date(3)]);
    }

    #[test]
    fn test_boundaries_need_body_fat_unless_disabled() {
        let days = vec![
            day(1, Some(80.0), None, Some(2000.0)),
            day(2, Some(79.9), Some(20.0), Some(2000.0)),
            day(3, Some(79.8), Some(19.9), Some(2000.0)),
            day(4, Some(79.7), None, Some(2000.0)),
        ];

        let config = WindowConfig::default();
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(2), date(3)]);

        let relaxed = WindowConfig {
            require_body_fat: false,
            ..Default::default()
        };
        let window = RangeSelector::new(&relaxed).select(&days).unwrap();
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn test_from_to_clip() {
        let days: Vec<MergedDay> = (1..=6)
            .map(|d| day(d, Some(80.0), Some(20.0), Some(2000.0)))
            .collect();

        let config = WindowConfig {
            from: Some(date(2)),
            to: Some(date(4)),
            ..Default::default()
        };
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(dates(&window), vec![date(2), date(3), date(4)]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let days = vec![
            day(5, Some(79.0), Some(19.0), Some(2000.0)),
            day(1, Some(80.0), Some(20.0), Some(2000.0)),
        ];

        let config = WindowConfig::default();
        let window = RangeSelector::new(&config).select(&days).unwrap();
        assert_eq!(window.first().map(|d| d.date), Some(date(1)));
        assert_eq!(window.last().map(|d| d.date), Some(date(5)));
    }

    #[test]
    fn test_insufficient_window() {
        let config = WindowConfig::default();

        let single = vec![day(1, Some(80.0), Some(20.0), Some(2000.0))];
        let result = RangeSelector::new(&config).select(&single);
        assert!(matches!(
            result,
            Err(BalanceError::InsufficientWindow { available: 1 })
        ));

        let none = vec![day(1, None, None, Some(2000.0))];
        let result = RangeSelector::new(&config).select(&none);
        assert!(matches!(
            result,
            Err(BalanceError::InsufficientWindow { available: 0 })
        ));

        assert!(RangeSelector::new(&config).select(&[]).is_err());
    }
}
