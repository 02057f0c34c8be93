//! Energy Balance - daily health-sample aggregation and TDEE estimation
//!
//! Energy Balance turns raw health-platform samples into per-day records and an
//! energy-balance report through a deterministic pipeline: dataset adaptation →
//! extraction → daily aggregation → merge → window selection → statistics.
//!
//! ## Modules
//!
//! - **Daily records**: one merged row per calendar day (weight, body fat,
//!   nutrition, steps, heart minutes, expended calories, sleep)
//! - **Statistics**: averages, body-composition change, TDEE and weekly buckets

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod extract;
pub mod merge;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod stats;
pub mod summary;
pub mod types;
pub mod window;

pub use calendar::{format_day, parse_day, CalendarPolicy};
pub use config::BalanceConfig;
pub use error::BalanceError;
pub use pipeline::{analyze, Analysis, BalanceProcessor, MetricSeriesSet};
pub use source::{DatasetSource, DirectorySource};
pub use types::{MergedDay, Metric, StatisticsReport};

/// Version embedded in every report
pub const BALANCE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "energy-balance";
