//! Pipeline orchestration
//!
//! This module provides the public API for Energy Balance.
//! It orchestrates the full pipeline from raw datasets to a statistics report.

use crate::aggregate::DailyAggregator;
use crate::calendar::CalendarPolicy;
use crate::config::BalanceConfig;
use crate::error::BalanceError;
use crate::extract::SampleExtractor;
use crate::merge::RecordMerger;
use crate::schema::{Dataset, DatasetAdapter};
use crate::source::DatasetSource;
use crate::stats::StatisticsEngine;
use crate::summary::SummaryEncoder;
use crate::types::{AnalysisWindow, DailyTable, MergedDay, Metric, RawSample, StatisticsReport};
use crate::window::RangeSelector;
use std::collections::BTreeMap;

/// Raw samples of one run, keyed by metric. A missing metric is an empty series.
#[derive(Debug, Clone, Default)]
pub struct MetricSeriesSet {
    series: BTreeMap<Metric, Vec<RawSample>>,
}

impl MetricSeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, samples: Vec<RawSample>) {
        self.series.insert(metric, samples);
    }

    /// Insert a dataset's points as the series of `metric`
    pub fn insert_dataset(&mut self, metric: Metric, dataset: &Dataset) {
        self.insert(metric, DatasetAdapter::to_samples(dataset));
    }

    pub fn get(&self, metric: Metric) -> &[RawSample] {
        self.series.get(&metric).map_or(&[], Vec::as_slice)
    }

    /// Total number of samples over all metrics
    pub fn sample_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Every merged day, before window selection
    pub days: Vec<MergedDay>,
    pub window: AnalysisWindow,
    pub report: StatisticsReport,
}

/// Run the full pipeline over already-fetched series.
///
/// # Example
/// ```ignore
/// let analysis = analyze(&series, &BalanceConfig::default())?;
/// println!("TDEE: {:.0}", analysis.report.composition.tdee);
/// ```
pub fn analyze(series: &MetricSeriesSet, config: &BalanceConfig) -> Result<Analysis, BalanceError> {
    BalanceProcessor::new(config.clone())?.process(series)
}

/// Processor bound to one validated configuration
pub struct BalanceProcessor {
    config: BalanceConfig,
    calendar: CalendarPolicy,
    encoder: SummaryEncoder,
}

impl BalanceProcessor {
    /// Create a processor, validating the configuration
    pub fn new(config: BalanceConfig) -> Result<Self, BalanceError> {
        config.validate()?;
        let calendar = config.calendar()?;
        Ok(Self {
            config,
            calendar,
            encoder: SummaryEncoder::new(),
        })
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    pub fn calendar(&self) -> &CalendarPolicy {
        &self.calendar
    }

    /// Fetch every metric from `source`.
    ///
    /// Weight is fetched first over `[start_nanos, end_nanos]`; the calendar days
    /// spanned by its samples then bound the requests for every other metric.
    pub fn fetch_series(
        &self,
        source: &dyn DatasetSource,
        start_nanos: i64,
        end_nanos: i64,
    ) -> Result<MetricSeriesSet, BalanceError> {
        let mut series = MetricSeriesSet::new();

        let weight = self.fetch_metric(source, Metric::Weight, start_nanos, end_nanos)?;
        let (start_nanos, end_nanos) = match (weight.first(), weight.last()) {
            (Some(first), Some(last)) => {
                let first_day = self.calendar.date_of_nanos(first.start_time_nanos)?;
                let last_day = self.calendar.date_of_nanos(last.start_time_nanos)?;
                (
                    self.calendar.day_start_nanos(first_day)?,
                    self.calendar.day_end_nanos(last_day)?,
                )
            }
            _ => (start_nanos, end_nanos),
        };
        tracing::debug!(start_nanos, end_nanos, "bounding fetches by weight range");
        series.insert(Metric::Weight, weight);

        for metric in Metric::ALL.into_iter().filter(|m| *m != Metric::Weight) {
            let samples = self.fetch_metric(source, metric, start_nanos, end_nanos)?;
            series.insert(metric, samples);
        }

        Ok(series)
    }

    fn fetch_metric(
        &self,
        source: &dyn DatasetSource,
        metric: Metric,
        start_nanos: i64,
        end_nanos: i64,
    ) -> Result<Vec<RawSample>, BalanceError> {
        let source_id = self.config.sources.get(metric);
        match source.fetch(source_id, start_nanos, end_nanos) {
            Ok(dataset) => Ok(DatasetAdapter::to_samples(&dataset)),
            Err(BalanceError::MissingMetricData(detail)) => {
                tracing::warn!(metric = metric.as_str(), %detail, "no data, using empty series");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Extract, aggregate and merge: one row per calendar day.
    ///
    /// Pipeline stages:
    /// 1. SampleExtractor - Resolve samples to dated records
    /// 2. DailyAggregator - Fold each metric to one value per day
    /// 3. RecordMerger - Outer-join the metrics on date
    pub fn daily_rows(&self, series: &MetricSeriesSet) -> Result<Vec<MergedDay>, BalanceError> {
        let extractor = SampleExtractor::new(&self.calendar);

        let mut tables: Vec<DailyTable> = Vec::with_capacity(Metric::ALL.len());
        for metric in Metric::ALL {
            let records = extractor.extract(metric, series.get(metric))?;
            tables.push(DailyAggregator::aggregate(metric, &records));
        }

        Ok(RecordMerger::merge(&tables))
    }

    /// Run the full pipeline over already-fetched series.
    ///
    /// After [`Self::daily_rows`]:
    /// 4. RangeSelector - Pick the analysis window
    /// 5. StatisticsEngine - Totals, averages, composition, TDEE, weeks
    pub fn process(&self, series: &MetricSeriesSet) -> Result<Analysis, BalanceError> {
        tracing::debug!(samples = series.sample_count(), "processing series");

        let days = self.daily_rows(series)?;
        let window = RangeSelector::new(&self.config.window).select(&days)?;
        let report = StatisticsEngine::new(&self.config)
            .compute(&window, self.encoder.meta(&self.config.timezone))?;

        Ok(Analysis {
            days,
            window,
            report,
        })
    }

    /// Fetch from `source` and process
    pub fn run(
        &self,
        source: &dyn DatasetSource,
        start_nanos: i64,
        end_nanos: i64,
    ) -> Result<Analysis, BalanceError> {
        let series = self.fetch_series(source, start_nanos, end_nanos)?;
        self.process(&series)
    }

    /// Text block for the notification collaborator
    pub fn summary_text(&self, report: &StatisticsReport) -> Result<String, BalanceError> {
        self.encoder.encode_text(report)
    }

    pub fn summary_json(&self, report: &StatisticsReport, pretty: bool) -> Result<String, BalanceError> {
        self.encoder.encode_json(report, pretty)
    }
}
