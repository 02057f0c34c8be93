//! Daily aggregation
//!
//! Folds a metric's dated records into exactly one value per calendar day.
//! Additive metrics are summed onto a zeroed accumulator, point measurements
//! keep the last reading of the day.

use crate::extract::round2;
use crate::types::{
    DailyTable, DailyValue, Metric, NutritionDay, Reading, Reduction, SampleRecord, SleepDay,
};

/// Aggregator folding dated records into a daily table
pub struct DailyAggregator;

impl DailyAggregator {
    /// Fold records into one row per distinct date.
    ///
    /// Records are stably sorted by timestamp first, so "last of the day" is the
    /// chronologically last measurement regardless of input order.
    pub fn aggregate(metric: Metric, records: &[SampleRecord]) -> DailyTable {
        let mut ordered: Vec<&SampleRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.timestamp_nanos);

        let mut table = DailyTable::new(metric);

        for record in ordered {
            let slot = table
                .rows
                .entry(record.date)
                .or_insert_with(|| empty_value(metric));
            fold(slot, metric.reduction(), &record.reading);
        }

        for value in table.rows.values_mut() {
            if let DailyValue::Sleep(sleep) = value {
                sleep.hours = round2(sleep.hours);
                sleep.asleep_hours = round2(sleep.asleep_hours);
                for hours in sleep.stage_hours.values_mut() {
                    *hours = round2(*hours);
                }
            }
        }

        tracing::debug!(metric = metric.as_str(), days = table.len(), "aggregated");
        table
    }
}

fn empty_value(metric: Metric) -> DailyValue {
    match metric {
        Metric::Nutrition => DailyValue::Nutrition(NutritionDay::default()),
        Metric::Sleep => DailyValue::Sleep(SleepDay::default()),
        _ => DailyValue::Scalar(0.0),
    }
}

fn fold(slot: &mut DailyValue, reduction: Reduction, reading: &Reading) {
    match (slot, reading) {
        (DailyValue::Scalar(current), Reading::Scalar(value)) => match reduction {
            Reduction::Sum => *current += value,
            Reduction::Last => *current = *value,
        },
        (DailyValue::Nutrition(day), Reading::Nutrition { facts, food }) => {
            day.facts += *facts;
            day.entries += 1;
            if let Some(food) = food {
                day.foods.push(food.clone());
            }
        }
        (DailyValue::Sleep(day), Reading::Sleep { stage, hours }) => {
            day.stages.insert(*stage);
            *day.stage_hours.entry(*stage).or_insert(0.0) += hours;
            day.hours += hours;
            if stage.is_asleep() {
                day.asleep_hours += hours;
            }
        }
        (slot, reading) => {
            tracing::warn!(?slot, ?reading, "reading does not match daily value, ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NutritionFacts, SleepStage};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn scalar(d: u32, ts: i64, value: f64) -> SampleRecord {
        SampleRecord {
            date: day(d),
            timestamp_nanos: ts,
            reading: Reading::Scalar(value),
        }
    }

    fn food(d: u32, ts: i64, calories: f64, name: &str) -> SampleRecord {
        SampleRecord {
            date: day(d),
            timestamp_nanos: ts,
            reading: Reading::Nutrition {
                facts: NutritionFacts {
                    calories,
                    protein: calories / 20.0,
                    ..Default::default()
                },
                food: Some(name.to_string()),
            },
        }
    }

    #[test]
    fn test_one_row_per_distinct_date() {
        let records = vec![
            scalar(1, 10, 1000.0),
            scalar(1, 20, 500.0),
            scalar(2, 30, 2000.0),
            scalar(4, 40, 10.0),
            scalar(4, 50, 10.0),
            scalar(4, 60, 10.0),
        ];

        let table = DailyAggregator::aggregate(Metric::Steps, &records);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows.get(&day(1)), Some(&DailyValue::Scalar(1500.0)));
        assert_eq!(table.rows.get(&day(4)), Some(&DailyValue::Scalar(30.0)));
    }

    #[test]
    fn test_sums_are_order_independent() {
        let records = vec![
            food(1, 10, 400.0, "Oats"),
            food(1, 20, 650.0, "Curry"),
            food(2, 30, 300.0, "Soup"),
            food(1, 40, 120.0, "Apple"),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let forward = DailyAggregator::aggregate(Metric::Nutrition, &records);
        let backward = DailyAggregator::aggregate(Metric::Nutrition, &reversed);
        assert_eq!(forward, backward);

        match forward.rows.get(&day(1)) {
            Some(DailyValue::Nutrition(n)) => {
                assert_eq!(n.facts.calories, 1170.0);
                assert_eq!(n.entries, 3);
            }
            other => panic!("expected nutrition, got {other:?}"),
        }
    }

    #[test]
    fn test_last_weight_of_day_wins() {
        // 80.0 at 08:00 and 80.2 at 08:05, given out of order
        let eight = 8 * 3_600_000_000_000;
        let eight_oh_five = eight + 5 * 60_000_000_000;
        let records = vec![scalar(3, eight_oh_five, 80.2), scalar(3, eight, 80.0)];

        let table = DailyAggregator::aggregate(Metric::Weight, &records);
        assert_eq!(table.rows.get(&day(3)), Some(&DailyValue::Scalar(80.2)));
    }

    #[test]
    fn test_food_labels_keep_order_and_duplicates() {
        let records = vec![
            food(1, 10, 100.0, "Coffee"),
            food(1, 20, 500.0, "Sandwich"),
            food(1, 30, 100.0, "Coffee"),
        ];

        let table = DailyAggregator::aggregate(Metric::Nutrition, &records);
        match table.rows.get(&day(1)) {
            Some(DailyValue::Nutrition(n)) => {
                assert_eq!(n.foods, vec!["Coffee", "Sandwich", "Coffee"]);
            }
            other => panic!("expected nutrition, got {other:?}"),
        }
    }

    #[test]
    fn test_sleep_stages_deduplicated_and_hours_summed() {
        let segment = |ts: i64, stage: SleepStage, hours: f64| SampleRecord {
            date: day(5),
            timestamp_nanos: ts,
            reading: Reading::Sleep { stage, hours },
        };
        let records = vec![
            segment(1, SleepStage::Light, 1.1),
            segment(2, SleepStage::Deep, 0.9),
            segment(3, SleepStage::Awake, 0.2),
            segment(4, SleepStage::Light, 2.2),
            segment(5, SleepStage::Rem, 1.3),
        ];

        let table = DailyAggregator::aggregate(Metric::Sleep, &records);
        match table.rows.get(&day(5)) {
            Some(DailyValue::Sleep(s)) => {
                assert_eq!(s.hours, 5.7);
                assert_eq!(s.asleep_hours, 5.5);
                assert_eq!(s.stages.len(), 4);
                assert_eq!(s.stage_hours.get(&SleepStage::Light), Some(&3.3));
                assert_eq!(s.stage_hours.get(&SleepStage::Awake), Some(&0.2));
            }
            other => panic!("expected sleep, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let table = DailyAggregator::aggregate(Metric::Weight, &[]);
        assert!(table.is_empty());
        assert_eq!(table.metric, Metric::Weight);
    }
}
