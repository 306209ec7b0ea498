use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::FiscalCalendar;
use crate::perspectives::ProjectMetadata;
use crate::series::{parse_revenue_cell, RevenueRecord};
use crate::stats::safe_pct;
use crate::types::{with_metadata, ComputationOutput};
use crate::ForecastResult;

const CRITICAL_PENALTY: u32 = 20;
const WARNING_PENALTY: u32 = 10;
const INFO_PENALTY: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityInput {
    pub records: Vec<RevenueRecord>,
    #[serde(default)]
    pub projects: Vec<ProjectMetadata>,
    #[serde(default)]
    pub calendar: FiscalCalendar,
}

/// Findings in three tiers plus the derived 0–100 score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Critical issues
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub overall_score: u32,
}

impl DataQualityReport {
    /// 100 minus 20 per critical issue, 10 per warning and 2 per note,
    /// floored at 0.
    pub fn score(critical: usize, warnings: usize, info: usize) -> u32 {
        let penalty = critical as u32 * CRITICAL_PENALTY
            + warnings as u32 * WARNING_PENALTY
            + info as u32 * INFO_PENALTY;
        100u32.saturating_sub(penalty)
    }

    fn finish(mut self) -> Self {
        self.overall_score = Self::score(self.issues.len(), self.warnings.len(), self.info.len());
        self
    }
}

/// Score the raw input records before any series is built.
pub fn assess_data_quality(
    input: &DataQualityInput,
) -> ForecastResult<ComputationOutput<DataQualityReport>> {
    let start = Instant::now();
    input.calendar.validate()?;

    let report = if input.records.is_empty() {
        DataQualityReport {
            issues: vec!["No revenue records supplied".into()],
            ..Default::default()
        }
        .finish()
    } else {
        check_records(input).finish()
    };

    log::debug!(
        "data quality: {} critical, {} warnings, {} info, score {}",
        report.issues.len(),
        report.warnings.len(),
        report.info.len(),
        report.overall_score
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tiered data quality checks (critical -20, warning -10, info -2)",
        &serde_json::json!({
            "records": input.records.len(),
            "projects": input.projects.len(),
        }),
        Vec::new(),
        elapsed,
        report,
    ))
}

fn check_records(input: &DataQualityInput) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    let records = &input.records;
    let total = Decimal::from(records.len() as u64);

    // Completeness
    let missing_project = records.iter().filter(|r| r.project_id.trim().is_empty()).count();
    let missing_period = records
        .iter()
        .filter(|r| r.period.as_deref().map_or(true, |p| p.trim().is_empty()))
        .count();
    let missing_revenue = records.iter().filter(|r| is_missing(&r.revenue)).count();

    for (field, missing) in [
        ("project_id", missing_project),
        ("period", missing_period),
        ("revenue", missing_revenue),
    ] {
        let pct = safe_pct(Decimal::from(missing as u64), total);
        let line = format!("{field}: {}% missing data", pct.round_dp(1));
        if pct > dec!(50) {
            report.issues.push(format!("{line} (critical)"));
        } else if pct > dec!(20) {
            report.warnings.push(line);
        } else if missing > 0 {
            report.info.push(line);
        }
    }

    // Revenue values
    let present: Vec<&serde_json::Value> = records
        .iter()
        .filter_map(|r| r.revenue.as_ref())
        .filter(|v| !is_blank(v))
        .collect();
    let parsed: Vec<Decimal> = present.iter().filter_map(|v| parse_revenue_cell(v)).collect();
    let unparseable = present.len() - parsed.len();

    if !present.is_empty() && parsed.is_empty() {
        report.issues.push("revenue: no valid numeric data".into());
    } else if unparseable > 0 {
        report
            .warnings
            .push(format!("revenue: {unparseable} value(s) could not be parsed as numbers"));
    }

    let zeros = parsed.iter().filter(|v| v.is_zero()).count();
    if Decimal::from(zeros as u64) > total * dec!(0.8) {
        report.warnings.push(format!(
            "revenue: {}% zero values",
            safe_pct(Decimal::from(zeros as u64), total).round_dp(1)
        ));
    }

    let negatives = parsed.iter().filter(|v| v.is_sign_negative() && !v.is_zero()).count();
    if negatives > 0 {
        report
            .warnings
            .push(format!("revenue: {negatives} negative value(s)"));
    }

    // Periods
    let bad_periods = records
        .iter()
        .filter_map(|r| r.period.as_deref())
        .filter(|p| !p.trim().is_empty() && input.calendar.parse_period(p).is_none())
        .count();
    if bad_periods > 0 {
        report
            .warnings
            .push(format!("period: {bad_periods} value(s) are not recognizable dates"));
    }

    // Metadata consistency
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for meta in &input.projects {
        *seen.entry(meta.project_id.as_str()).or_insert(0) += 1;
    }
    let duplicate_ids: usize = seen.values().filter(|n| **n > 1).map(|n| n - 1).sum();
    if duplicate_ids > 0 {
        report
            .warnings
            .push(format!("{duplicate_ids} duplicate project id(s) in project metadata"));
    }

    if !input.projects.is_empty() {
        let unknown: BTreeSet<&str> = records
            .iter()
            .map(|r| r.project_id.trim())
            .filter(|id| !id.is_empty() && !seen.contains_key(id))
            .collect();
        if !unknown.is_empty() {
            report.info.push(format!(
                "{} project(s) in revenue records have no metadata",
                unknown.len()
            ));
        }
    }

    report
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_missing(value: &Option<serde_json::Value>) -> bool {
    value.as_ref().map_or(true, is_blank)
}
