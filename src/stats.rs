//! Statistics engine
//!
//! Computes the report of an analysis window:
//! - Totals and per-day averages (averages only over days reporting a field)
//! - Composition change from the first to the last day and the TDEE it implies
//! - Weekly buckets of average weight, body fat and intake

use crate::config::{BalanceConfig, BoundaryDay};
use crate::error::BalanceError;
use crate::window::MIN_WINDOW_DAYS;
use crate::types::{
    AnalysisWindow, Averages, CompositionChange, MergedDay, NutritionFacts, ReportMeta,
    StatisticsReport, Totals, WeeklySummary,
};

/// Statistics engine for one configuration
pub struct StatisticsEngine<'a> {
    config: &'a BalanceConfig,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(config: &'a BalanceConfig) -> Self {
        Self { config }
    }

    /// Compute the full report. Any statistic without data fails the whole run.
    pub fn compute(
        &self,
        window: &AnalysisWindow,
        meta: ReportMeta,
    ) -> Result<StatisticsReport, BalanceError> {
        let (first, last) = boundaries(window)?;

        let totals = totals(&window.days);
        let averages = averages(&window.days, self.config.window.require_body_fat)?;
        let composition = self.composition(window)?;
        let weeks = weekly_buckets(&window.days, self.config.week_length);

        tracing::debug!(
            days = window.len(),
            tdee = composition.tdee,
            weeks = weeks.len(),
            "computed statistics"
        );

        Ok(StatisticsReport {
            meta,
            start: first.date,
            end: last.date,
            days: window.len(),
            totals,
            averages,
            composition,
            weeks,
        })
    }

    /// Composition change between the boundary days and the resulting TDEE
    pub fn composition(&self, window: &AnalysisWindow) -> Result<CompositionChange, BalanceError> {
        let (first, last) = boundaries(window)?;

        let (start_weight, start_fat_percentage) = body_reading(first)?;
        let (end_weight, end_fat_percentage) = body_reading(last)?;

        let weight_delta = end_weight - start_weight;
        let start_fat_mass = start_fat_percentage * start_weight / 100.0;
        let end_fat_mass = end_fat_percentage * end_weight / 100.0;
        let fat_delta = end_fat_mass - start_fat_mass;
        let lean_delta = weight_delta - fat_delta;

        let densities = &self.config.densities;
        let fat_energy = densities.fat_energy(fat_delta);
        let lean_energy = densities.lean_energy(lean_delta);
        let stored_energy = fat_energy + lean_energy;

        let counted: &[MergedDay] = match self.config.excluded_day() {
            Some(BoundaryDay::Last) => &window.days[..window.len() - 1],
            Some(BoundaryDay::First) => &window.days[1..],
            None => &window.days,
        };
        let intake_counted: f64 = counted.iter().filter_map(|d| d.intake_calories()).sum();
        let days_counted = counted.len();
        if days_counted == 0 {
            return Err(BalanceError::InsufficientData(
                "no days counted towards TDEE".to_string(),
            ));
        }

        let tdee = (intake_counted - stored_energy) / days_counted as f64;

        Ok(CompositionChange {
            start_weight,
            end_weight,
            weight_delta,
            start_fat_percentage,
            end_fat_percentage,
            fat_percentage_delta: end_fat_percentage - start_fat_percentage,
            start_fat_mass,
            end_fat_mass,
            fat_delta,
            start_lean_mass: start_weight - start_fat_mass,
            end_lean_mass: end_weight - end_fat_mass,
            lean_delta,
            fat_energy,
            lean_energy,
            stored_energy,
            intake_counted,
            days_counted,
            tdee,
        })
    }
}

/// First and last day of a window holding at least two days
fn boundaries(window: &AnalysisWindow) -> Result<(&MergedDay, &MergedDay), BalanceError> {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if window.len() >= MIN_WINDOW_DAYS => Ok((first, last)),
        _ => Err(BalanceError::InsufficientWindow {
            available: window.len(),
        }),
    }
}

fn body_reading(day: &MergedDay) -> Result<(f64, f64), BalanceError> {
    match (day.weight, day.fat_percentage) {
        (Some(weight), Some(fat)) => Ok((weight, fat)),
        (None, _) => Err(BalanceError::InsufficientData(format!(
            "no weight on boundary day {}",
            day.date
        ))),
        (_, None) => Err(BalanceError::InsufficientData(format!(
            "no body fat percentage on boundary day {}",
            day.date
        ))),
    }
}

/// Sum every field; missing values contribute zero
pub fn totals(days: &[MergedDay]) -> Totals {
    let mut totals = Totals::default();
    for day in days {
        if let Some(n) = &day.nutrition {
            totals.intake += n.facts;
        }
        totals.steps += day.steps.unwrap_or(0.0);
        totals.heart_minutes += day.heart_minutes.unwrap_or(0.0);
        totals.expended_calories += day.expended_calories.unwrap_or(0.0);
        totals.sleep_hours += day.sleep.as_ref().map_or(0.0, |s| s.asleep_hours);
    }
    totals
}

/// Averages over the days reporting each field
pub fn averages(days: &[MergedDay], require_body_fat: bool) -> Result<Averages, BalanceError> {
    let nutrition: Vec<NutritionFacts> = days
        .iter()
        .filter_map(|d| d.nutrition.as_ref().map(|n| n.facts))
        .collect();
    if nutrition.is_empty() {
        return Err(BalanceError::InsufficientData(
            "no logged intake to average".to_string(),
        ));
    }
    let mut intake = NutritionFacts::default();
    for facts in &nutrition {
        intake += *facts;
    }
    let intake = intake.divided_by(nutrition.len() as f64);

    let weight = mean(days.iter().filter_map(|d| d.weight))
        .ok_or_else(|| BalanceError::InsufficientData("no weight to average".to_string()))?;

    let fat_percentage = mean(days.iter().filter_map(|d| d.fat_percentage));
    if require_body_fat && fat_percentage.is_none() {
        return Err(BalanceError::InsufficientData(
            "no body fat percentage to average".to_string(),
        ));
    }

    Ok(Averages {
        intake,
        weight,
        fat_percentage,
        steps: mean(days.iter().filter_map(|d| d.steps)),
        heart_minutes: mean(days.iter().filter_map(|d| d.heart_minutes)),
        expended_calories: mean(days.iter().filter_map(|d| d.expended_calories)),
        sleep_hours: mean(days.iter().filter_map(|d| d.sleep.as_ref().map(|s| s.asleep_hours))),
    })
}

/// Split days into consecutive buckets of `week_length` rows in date order
pub fn weekly_buckets(days: &[MergedDay], week_length: usize) -> Vec<WeeklySummary> {
    days.chunks(week_length.max(1))
        .enumerate()
        .map(|(index, week)| WeeklySummary {
            index: index + 1,
            start: week[0].date,
            end: week[week.len() - 1].date,
            days: week.len(),
            avg_weight: mean(week.iter().filter_map(|d| d.weight)),
            avg_fat_percentage: mean(week.iter().filter_map(|d| d.fat_percentage)),
            avg_intake_calories: mean(week.iter().filter_map(|d| d.intake_calories())),
        })
        .collect()
}

/// Mean of the values, `None` when there are none
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnergyDensities, WeighTime};
    use crate::types::{NutritionDay, SleepDay};
    use chrono::{Duration, NaiveDate};

    fn meta() -> ReportMeta {
        ReportMeta {
            producer: "test".to_string(),
            version: "0.0.0".to_string(),
            run_id: "run".to_string(),
            computed_at_utc: "2024-01-01T00:00:00Z".to_string(),
            timezone: "UTC".to_string(),
        }
    }

    fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn day(offset: i64, weight: Option<f64>, fat: Option<f64>, calories: f64) -> MergedDay {
        let mut day = MergedDay::new(date(offset));
        day.weight = weight;
        day.fat_percentage = fat;
        day.nutrition = Some(NutritionDay {
            facts: NutritionFacts {
                calories,
                protein: 100.0,
                ..Default::default()
            },
            foods: Vec::new(),
            entries: 1,
        });
        day
    }

    /// 80kg @ 20% to 78kg @ 18%, `n` days of 4000 kcal
    fn losing_window(n: i64) -> AnalysisWindow {
        let days = (0..n)
            .map(|i| {
                if i == 0 {
                    day(i, Some(80.0), Some(20.0), 4000.0)
                } else if i == n - 1 {
                    day(i, Some(78.0), Some(18.0), 4000.0)
                } else {
                    day(i, None, None, 4000.0)
                }
            })
            .collect();
        AnalysisWindow { days }
    }

    fn reference_config(weigh_time: WeighTime) -> BalanceConfig {
        BalanceConfig {
            weigh_time,
            densities: EnergyDensities {
                fat_store: 7700.0,
                fat_build: 8840.0,
                muscle_store: 1250.0,
                muscle_build: 5940.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_tdee_arithmetic_chain() {
        // 10 counted days, 40000 kcal, all days count with night weigh-ins
        let config = reference_config(WeighTime::Night);
        let change = StatisticsEngine::new(&config)
            .composition(&losing_window(10))
            .unwrap();

        assert!((change.fat_delta - (-1.96)).abs() < 1e-9);
        assert!((change.lean_delta - (-0.04)).abs() < 1e-9);
        assert!((change.fat_energy - (-15092.0)).abs() < 1e-6);
        assert!((change.lean_energy - (-50.0)).abs() < 1e-6);
        assert!((change.stored_energy - (-15142.0)).abs() < 1e-6);
        assert_eq!(change.intake_counted, 40000.0);
        assert_eq!(change.days_counted, 10);
        assert!((change.tdee - 5514.2).abs() < 1e-6);
    }

    #[test]
    fn test_morning_weigh_in_excludes_last_day() {
        // 11 window days: the last day's intake is not in the weight change
        let config = reference_config(WeighTime::Morning);
        let change = StatisticsEngine::new(&config)
            .composition(&losing_window(11))
            .unwrap();

        assert_eq!(change.days_counted, 10);
        assert_eq!(change.intake_counted, 40000.0);
        assert!((change.tdee - 5514.2).abs() < 1e-6);
    }

    #[test]
    fn test_morning_weigh_in_can_exclude_first_day() {
        let mut config = reference_config(WeighTime::Morning);
        config.morning_excludes = BoundaryDay::First;
        let mut window = losing_window(3);
        window.days[0].nutrition.as_mut().unwrap().facts.calories = 9999.0;

        let change = StatisticsEngine::new(&config).composition(&window).unwrap();
        assert_eq!(change.days_counted, 2);
        assert_eq!(change.intake_counted, 8000.0);
    }

    #[test]
    fn test_gains_use_build_densities() {
        let config = reference_config(WeighTime::Night);
        let window = AnalysisWindow {
            days: vec![
                day(0, Some(70.0), Some(10.0), 3000.0),
                day(1, Some(71.0), Some(10.0), 3000.0),
            ],
        };

        let change = StatisticsEngine::new(&config).composition(&window).unwrap();
        // fat 7.0 -> 7.1 kg, lean 63.0 -> 63.9 kg
        assert!((change.fat_delta - 0.1).abs() < 1e-9);
        assert!((change.lean_delta - 0.9).abs() < 1e-9);
        assert!((change.fat_energy - 884.0).abs() < 1e-6);
        assert!((change.lean_energy - 0.9 * 5940.0).abs() < 1e-6);
        assert!((change.end_lean_mass - 63.9).abs() < 1e-9);
    }

    #[test]
    fn test_missing_boundary_fat_is_insufficient_data() {
        let config = reference_config(WeighTime::Night);
        let window = AnalysisWindow {
            days: vec![
                day(0, Some(80.0), None, 2000.0),
                day(1, Some(79.0), Some(20.0), 2000.0),
            ],
        };

        let result = StatisticsEngine::new(&config).composition(&window);
        assert!(matches!(result, Err(BalanceError::InsufficientData(_))));
    }

    #[test]
    fn test_short_window_is_insufficient_window() {
        let config = reference_config(WeighTime::Night);
        let engine = StatisticsEngine::new(&config);

        let empty = AnalysisWindow { days: Vec::new() };
        assert!(matches!(
            engine.composition(&empty),
            Err(BalanceError::InsufficientWindow { available: 0 })
        ));
        assert!(matches!(
            engine.compute(&empty, meta()),
            Err(BalanceError::InsufficientWindow { available: 0 })
        ));

        let single = AnalysisWindow {
            days: vec![day(0, Some(80.0), Some(20.0), 2000.0)],
        };
        assert!(matches!(
            engine.composition(&single),
            Err(BalanceError::InsufficientWindow { available: 1 })
        ));
    }

    #[test]
    fn test_weekly_buckets_seven_then_three() {
        let window = losing_window(10);
        let weeks = weekly_buckets(&window.days, 7);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].days, 7);
        assert_eq!(weeks[0].start, date(0));
        assert_eq!(weeks[0].end, date(6));
        assert_eq!(weeks[1].days, 3);
        assert_eq!(weeks[1].start, date(7));
        assert_eq!(weeks[1].end, date(9));
    }

    #[test]
    fn test_weekly_averages_skip_non_reporting_days() {
        let window = losing_window(10);
        let weeks = weekly_buckets(&window.days, 7);

        // only the first day of week 1 reports weight
        assert_eq!(weeks[0].avg_weight, Some(80.0));
        assert_eq!(weeks[0].avg_fat_percentage, Some(20.0));
        assert_eq!(weeks[1].avg_weight, Some(78.0));
        assert_eq!(weeks[0].avg_intake_calories, Some(4000.0));

        let blank = vec![MergedDay::new(date(0))];
        let weeks = weekly_buckets(&blank, 7);
        assert_eq!(weeks[0].avg_weight, None);
    }

    #[test]
    fn test_averages_over_reporting_days_only() {
        let mut days = losing_window(4).days;
        days[1].sleep = Some(SleepDay {
            hours: 7.5,
            asleep_hours: 7.0,
            ..Default::default()
        });
        days[2].sleep = Some(SleepDay {
            hours: 8.0,
            asleep_hours: 8.0,
            ..Default::default()
        });

        let averages = averages(&days, true).unwrap();
        assert_eq!(averages.sleep_hours, Some(7.5));
        assert_eq!(averages.weight, 79.0);
        assert_eq!(averages.fat_percentage, Some(19.0));
        assert_eq!(averages.intake.calories, 4000.0);
        assert_eq!(averages.steps, None);

        let totals = totals(&days);
        assert_eq!(totals.sleep_hours, 15.0);
        assert_eq!(totals.intake.calories, 16000.0);
        assert_eq!(totals.intake.protein, 400.0);
        assert_eq!(totals.steps, 0.0);
    }

    #[test]
    fn test_averages_without_weight_fail() {
        let days = vec![day(0, None, None, 2000.0)];
        let result = averages(&days, false);
        assert!(matches!(result, Err(BalanceError::InsufficientData(_))));
    }

    #[test]
    fn test_full_report() {
        let config = reference_config(WeighTime::Night);
        let report = StatisticsEngine::new(&config)
            .compute(&losing_window(10), meta())
            .unwrap();

        assert_eq!(report.days, 10);
        assert_eq!(report.start, date(0));
        assert_eq!(report.end, date(9));
        assert_eq!(report.weeks.len(), 2);
        assert!(report.composition.tdee.is_finite());
    }
}
