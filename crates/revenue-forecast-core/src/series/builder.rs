use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{add_months, sub_months, FiscalCalendar};
use crate::error::ForecastError;
use crate::types::{with_metadata, ComputationOutput, Granularity, Money};
use crate::ForecastResult;

/// Look-back window used when the input carries no usable date dimension.
pub const DEFAULT_FALLBACK_PERIODS: u32 = 24;

/// Upper bound on the synthesized window (100 years of monthly periods).
pub const MAX_FALLBACK_PERIODS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A raw revenue record as handed over by the upload/mapping layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub project_id: String,
    /// Date-like cell, e.g. "2024-03-15", "2024-03" or "2024Q1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// Raw revenue cell: a JSON number or text such as "$1,250.00"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<serde_json::Value>,
}

/// One bucket of the normalized historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub period_date: NaiveDate,
    pub period_label: String,
    pub revenue: Money,
    /// Fiscal quarter (1–4)
    pub quarter: u32,
    /// Fiscal year
    pub year: i32,
}

/// Revenue of one project in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRevenue {
    pub project_id: String,
    pub period_label: String,
    pub revenue: Money,
}

/// Input for the historical series builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesInput {
    pub records: Vec<RevenueRecord>,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub calendar: FiscalCalendar,
    /// Periods to spread revenue over when no record carries a usable date
    #[serde(default = "default_fallback_periods")]
    pub fallback_periods: u32,
    /// Anchor for the synthesized window; defaults to today (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

fn default_fallback_periods() -> u32 {
    DEFAULT_FALLBACK_PERIODS
}

impl SeriesInput {
    pub fn new(records: Vec<RevenueRecord>) -> Self {
        Self {
            records,
            granularity: Granularity::default(),
            calendar: FiscalCalendar::default(),
            fallback_periods: DEFAULT_FALLBACK_PERIODS,
            as_of: None,
        }
    }
}

/// Chronologically ordered revenue series.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub points: Vec<HistoricalPoint>,
    /// True when the points were spread evenly because no dates were usable
    pub synthesized: bool,
    pub total_revenue: Money,
    pub records_used: usize,
    pub records_dropped: usize,
}

impl HistoricalSeries {
    /// An empty series means "cannot forecast".
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&HistoricalPoint> {
        self.points.last()
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse a raw revenue cell. Text may carry currency symbols, thousands
/// separators, or accounting-style parentheses for negatives.
pub fn parse_revenue_cell(cell: &serde_json::Value) -> Option<Decimal> {
    match cell {
        serde_json::Value::Number(n) => parse_decimal_text(&n.to_string()),
        serde_json::Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '£' | '€' | '_') && !c.is_whitespace())
                .collect();
            if let Some(inner) = cleaned
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
            {
                return parse_decimal_text(inner).map(|v| -v);
            }
            parse_decimal_text(&cleaned)
        }
        _ => None,
    }
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

fn record_revenue(record: &RevenueRecord) -> Option<Decimal> {
    record.revenue.as_ref().and_then(parse_revenue_cell)
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize raw revenue records into an ordered per-period series.
///
/// Records are bucketed by calendar month (or fiscal quarter) and summed.
/// When no record carries a parseable period the total is spread evenly over
/// `fallback_periods` periods ending at `as_of`, so downstream projection
/// always has something to seed from. Zero records yield an empty series.
pub fn build_historical_series(
    input: &SeriesInput,
) -> ForecastResult<ComputationOutput<HistoricalSeries>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_series_input(input)?;

    let series = if input.records.is_empty() {
        warnings.push("No revenue records supplied; historical series is empty".into());
        log::warn!("historical series: no records, returning empty series");
        HistoricalSeries::default()
    } else {
        let dated: Vec<(&RevenueRecord, Option<NaiveDate>)> = input
            .records
            .iter()
            .map(|r| {
                let date = r
                    .period
                    .as_deref()
                    .and_then(|p| input.calendar.parse_period(p));
                (r, date)
            })
            .collect();

        if dated.iter().any(|(_, date)| date.is_some()) {
            bucket_by_period(input, &dated, &mut warnings)
        } else {
            synthesize_even_series(input, &mut warnings)
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Historical revenue series (period bucketing, even-distribution fallback)",
        &serde_json::json!({
            "records": input.records.len(),
            "granularity": input.granularity,
            "fiscal_year_start_month": input.calendar.start_month,
            "fallback_periods": input.fallback_periods,
        }),
        warnings,
        elapsed,
        series,
    ))
}

/// Normalize raw records into per-project, per-period revenue rows.
///
/// Records without a parseable period are dropped; no synthesis happens at
/// project level. Rows are ordered by period, then project.
pub fn build_project_series(
    input: &SeriesInput,
) -> ForecastResult<ComputationOutput<Vec<ProjectRevenue>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_series_input(input)?;

    let mut buckets: BTreeMap<(NaiveDate, String), Money> = BTreeMap::new();
    let mut dropped = 0usize;
    let mut unparsed_revenue = 0usize;

    for record in &input.records {
        let Some(date) = record
            .period
            .as_deref()
            .and_then(|p| input.calendar.parse_period(p))
        else {
            dropped += 1;
            continue;
        };
        let revenue = record_revenue(record).unwrap_or_else(|| {
            unparsed_revenue += 1;
            Decimal::ZERO
        });
        let key = (
            input.calendar.period_start(date, input.granularity),
            record.project_id.trim().to_string(),
        );
        *buckets.entry(key).or_insert(Decimal::ZERO) += revenue;
    }

    if dropped > 0 {
        warnings.push(format!(
            "{dropped} record(s) without a parseable period were excluded from project series"
        ));
    }
    if unparsed_revenue > 0 {
        warnings.push(format!(
            "{unparsed_revenue} record(s) had missing or non-numeric revenue; treated as 0"
        ));
    }

    let rows: Vec<ProjectRevenue> = buckets
        .into_iter()
        .map(|((date, project_id), revenue)| ProjectRevenue {
            project_id,
            period_label: input.calendar.label(date, input.granularity),
            revenue,
        })
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Per-project period revenue",
        &serde_json::json!({
            "records": input.records.len(),
            "granularity": input.granularity,
        }),
        warnings,
        elapsed,
        rows,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn validate_series_input(input: &SeriesInput) -> ForecastResult<()> {
    input.calendar.validate()?;
    if input.fallback_periods == 0 {
        return Err(ForecastError::invalid(
            "fallback_periods",
            "Fallback window must cover at least one period",
        ));
    }
    if input.fallback_periods > MAX_FALLBACK_PERIODS {
        return Err(ForecastError::invalid(
            "fallback_periods",
            format!(
                "Fallback window of {} periods exceeds the maximum of {MAX_FALLBACK_PERIODS}",
                input.fallback_periods
            ),
        ));
    }
    Ok(())
}

fn bucket_by_period(
    input: &SeriesInput,
    dated: &[(&RevenueRecord, Option<NaiveDate>)],
    warnings: &mut Vec<String>,
) -> HistoricalSeries {
    let mut buckets: BTreeMap<NaiveDate, Money> = BTreeMap::new();
    let mut records_used = 0usize;
    let mut records_dropped = 0usize;
    let mut unparsed_revenue = 0usize;

    for (record, date) in dated {
        let Some(date) = date else {
            records_dropped += 1;
            continue;
        };
        let revenue = record_revenue(record).unwrap_or_else(|| {
            unparsed_revenue += 1;
            Decimal::ZERO
        });
        let key = input.calendar.period_start(*date, input.granularity);
        *buckets.entry(key).or_insert(Decimal::ZERO) += revenue;
        records_used += 1;
    }

    if records_dropped > 0 {
        warnings.push(format!(
            "{records_dropped} record(s) had a missing or unparseable period and were dropped"
        ));
    }
    if unparsed_revenue > 0 {
        warnings.push(format!(
            "{unparsed_revenue} record(s) had missing or non-numeric revenue; treated as 0"
        ));
    }

    let mut points = Vec::with_capacity(buckets.len());
    for (date, sum) in buckets {
        let label = input.calendar.label(date, input.granularity);
        let revenue = if sum < Decimal::ZERO {
            warnings.push(format!(
                "Period {label} summed to negative revenue ({sum}); floored at 0"
            ));
            Decimal::ZERO
        } else {
            sum
        };
        points.push(HistoricalPoint {
            period_date: date,
            period_label: label,
            revenue,
            quarter: input.calendar.quarter_of(date),
            year: input.calendar.fiscal_year_of(date),
        });
    }

    log::debug!(
        "historical series: {} records bucketed into {} periods ({} dropped)",
        records_used,
        points.len(),
        records_dropped
    );

    HistoricalSeries {
        total_revenue: points.iter().map(|p| p.revenue).sum(),
        points,
        synthesized: false,
        records_used,
        records_dropped,
    }
}

fn synthesize_even_series(input: &SeriesInput, warnings: &mut Vec<String>) -> HistoricalSeries {
    let periods = input.fallback_periods;
    let step = input.granularity.months();
    let as_of = input.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let end = input.calendar.period_start(as_of, input.granularity);
    let first = sub_months(end, step * (periods - 1)).unwrap_or(end);

    let total: Money = input
        .records
        .iter()
        .filter_map(record_revenue)
        .sum::<Decimal>()
        .max(Decimal::ZERO);
    let per_period = total / Decimal::from(periods);

    let mut points = Vec::with_capacity(periods as usize);
    for i in 0..periods {
        let Some(date) = add_months(first, i * step) else {
            break;
        };
        points.push(HistoricalPoint {
            period_date: date,
            period_label: input.calendar.label(date, input.granularity),
            revenue: per_period,
            quarter: input.calendar.quarter_of(date),
            year: input.calendar.fiscal_year_of(date),
        });
    }

    let reason = if input.records.iter().any(|r| has_text(&r.period)) {
        "no period value could be parsed"
    } else {
        "records carry no period dimension"
    };
    warnings.push(format!(
        "Synthesized {periods}-period series by spreading total revenue evenly ({reason})"
    ));
    log::warn!("historical series: {reason}; spreading {total} over {periods} periods");

    HistoricalSeries {
        points,
        synthesized: true,
        total_revenue: total,
        records_used: input.records.len(),
        records_dropped: 0,
    }
}
