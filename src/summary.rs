//! Summary encoding
//!
//! Renders a statistics report as the text block handed to the notification
//! collaborator, or as JSON.

use crate::calendar::format_day;
use crate::error::BalanceError;
use crate::types::{ReportMeta, StatisticsReport};
use crate::{BALANCE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use std::fmt::Write;
use uuid::Uuid;

/// Encoder for report output
pub struct SummaryEncoder {
    run_id: String,
}

impl Default for SummaryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryEncoder {
    /// Create an encoder with a fresh run ID
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific run ID
    pub fn with_run_id(run_id: String) -> Self {
        Self { run_id }
    }

    /// Producer metadata stamped onto a report
    pub fn meta(&self, timezone: &str) -> ReportMeta {
        ReportMeta {
            producer: PRODUCER_NAME.to_string(),
            version: BALANCE_VERSION.to_string(),
            run_id: self.run_id.clone(),
            computed_at_utc: Utc::now().to_rfc3339(),
            timezone: timezone.to_string(),
        }
    }

    /// Encode to JSON
    pub fn encode_json(&self, report: &StatisticsReport, pretty: bool) -> Result<String, BalanceError> {
        let json = if pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }

    /// Encode to a human-readable text block
    pub fn encode_text(&self, report: &StatisticsReport) -> Result<String, BalanceError> {
        let mut out = String::new();
        self.write_text(&mut out, report)?;
        Ok(out)
    }

    fn write_text(&self, out: &mut String, report: &StatisticsReport) -> std::fmt::Result {
        let avg = &report.averages;
        let comp = &report.composition;

        writeln!(
            out,
            "Period: {} - {} ({} days)",
            format_day(report.start),
            format_day(report.end),
            report.days
        )?;
        writeln!(out)?;

        writeln!(out, "Average intake: {:.2} kcal", avg.intake.calories)?;
        writeln!(
            out,
            "Average macros: protein {:.2} g, carbs {:.2} g, fat {:.2} g, fiber {:.2} g",
            avg.intake.protein, avg.intake.carbs, avg.intake.fat, avg.intake.fiber
        )?;
        writeln!(out, "Average weight: {:.2} kg", avg.weight)?;
        if let Some(fat) = avg.fat_percentage {
            writeln!(out, "Average body fat: {fat:.2}%")?;
        }
        if let Some(steps) = avg.steps {
            writeln!(out, "Average steps: {steps:.0}")?;
        }
        if let Some(minutes) = avg.heart_minutes {
            writeln!(out, "Average heart points: {minutes:.2}")?;
        }
        if let Some(expended) = avg.expended_calories {
            writeln!(out, "Average expended (tracker): {expended:.2} kcal")?;
        }
        if let Some(hours) = avg.sleep_hours {
            writeln!(out, "Average sleep: {hours:.2} h")?;
        }
        writeln!(out)?;

        writeln!(
            out,
            "Weight: {:.2} -> {:.2} kg ({:+.2} kg)",
            comp.start_weight, comp.end_weight, comp.weight_delta
        )?;
        writeln!(
            out,
            "Body fat: {:.2}% -> {:.2}% ({:+.2}%)",
            comp.start_fat_percentage, comp.end_fat_percentage, comp.fat_percentage_delta
        )?;
        writeln!(
            out,
            "Fat mass: {:.2} -> {:.2} kg ({:+.2} kg, {:+.2} kcal)",
            comp.start_fat_mass, comp.end_fat_mass, comp.fat_delta, comp.fat_energy
        )?;
        writeln!(
            out,
            "Lean mass: {:.2} -> {:.2} kg ({:+.2} kg, {:+.2} kcal)",
            comp.start_lean_mass, comp.end_lean_mass, comp.lean_delta, comp.lean_energy
        )?;
        writeln!(
            out,
            "TDEE: {:.2} kcal/day over {} days",
            comp.tdee, comp.days_counted
        )?;

        if !report.weeks.is_empty() {
            writeln!(out)?;
            for week in &report.weeks {
                write!(
                    out,
                    "Week {} ({} - {}):",
                    week.index,
                    format_day(week.start),
                    format_day(week.end)
                )?;
                write!(out, " weight {}", optional(week.avg_weight, " kg"))?;
                write!(out, ", fat {}", optional(week.avg_fat_percentage, "%"))?;
                writeln!(out, ", intake {}", optional(week.avg_intake_calories, " kcal"))?;
            }
        }

        Ok(())
    }
}

fn optional(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{unit}"),
        None => "n/a".to_string(),
    }
}
