//! Calendar policy
//!
//! Maps sample timestamps onto calendar days in one explicit timezone, and
//! formats/parses the `DD/MM/YYYY` day keys used in reports.

use crate::error::BalanceError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Day key format used in reports and on the command line
pub const DAY_FORMAT: &str = "%d/%m/%Y";

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Timezone policy applied uniformly to every sample of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarPolicy {
    timezone: Tz,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

impl CalendarPolicy {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Build a policy from an IANA timezone name (e.g. "Europe/Amsterdam")
    pub fn from_name(name: &str) -> Result<Self, BalanceError> {
        let timezone: Tz = name
            .parse()
            .map_err(|e| BalanceError::InvalidTimezone(format!("{name}: {e}")))?;
        Ok(Self { timezone })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Calendar date of a nanosecond timestamp.
    ///
    /// Nanoseconds are floored to milliseconds first, so the day boundary is
    /// decided at millisecond precision.
    pub fn date_of_nanos(&self, nanos: i64) -> Result<NaiveDate, BalanceError> {
        let millis = nanos.div_euclid(NANOS_PER_MILLI);
        let instant: DateTime<Utc> = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| {
                BalanceError::DateParseError(format!("timestamp out of range: {nanos}ns"))
            })?;
        Ok(instant.with_timezone(&self.timezone).date_naive())
    }

    /// First nanosecond of `date` in this timezone
    pub fn day_start_nanos(&self, date: NaiveDate) -> Result<i64, BalanceError> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| BalanceError::DateParseError(format!("invalid day: {date}")))?;
        let local = self
            .timezone
            .from_local_datetime(&midnight)
            .earliest()
            .ok_or_else(|| {
                BalanceError::DateParseError(format!("no local midnight for {date}"))
            })?;
        local.timestamp_nanos_opt().ok_or_else(|| {
            BalanceError::DateParseError(format!("day out of nanosecond range: {date}"))
        })
    }

    /// Last nanosecond of `date` in this timezone (inclusive)
    pub fn day_end_nanos(&self, date: NaiveDate) -> Result<i64, BalanceError> {
        let next = date
            .succ_opt()
            .ok_or_else(|| BalanceError::DateParseError(format!("no day after {date}")))?;
        Ok(self.day_start_nanos(next)? - 1)
    }
}

/// Format a day as `DD/MM/YYYY`
pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Parse a `DD/MM/YYYY` day key. Inverse of [`format_day`].
pub fn parse_day(text: &str) -> Result<NaiveDate, BalanceError> {
    NaiveDate::parse_from_str(text.trim(), DAY_FORMAT)
        .map_err(|e| BalanceError::DateParseError(format!("{text}: {e}")))
}

/// Serde helpers for `NaiveDate` fields written as `DD/MM/YYYY`
pub mod day_key {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_day(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_day(&text).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for `Option<NaiveDate>`
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(d) => serializer.serialize_some(&crate::calendar::format_day(*d)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let text: Option<String> = Option::deserialize(deserializer)?;
            text.map(|t| crate::calendar::parse_day(&t).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
