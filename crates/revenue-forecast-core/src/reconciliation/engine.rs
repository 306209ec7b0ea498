use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::sort_by_period;
use crate::error::ForecastError;
use crate::perspectives::DualPerspective;
use crate::stats::{mean, safe_pct};
use crate::types::{with_metadata, ComputationOutput, Money, PeriodRevenue, Percent, Rate};
use crate::ForecastResult;

/// |variance_pct| above this marks a high-variance period.
const HIGH_VARIANCE_PCT: Decimal = dec!(20);
/// |variance_pct| above this (and at most HIGH) marks a medium-variance period.
const MEDIUM_VARIANCE_PCT: Decimal = dec!(10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationMethod {
    FinancePriority,
    SalesPriority,
    #[default]
    WeightedAverage,
}

impl ReconciliationMethod {
    pub fn reconcile(self, finance: Money, sales: Money, finance_weight: Rate) -> Money {
        match self {
            ReconciliationMethod::FinancePriority => finance,
            ReconciliationMethod::SalesPriority => sales,
            ReconciliationMethod::WeightedAverage => {
                finance * finance_weight + sales * (Decimal::ONE - finance_weight)
            }
        }
    }
}

impl fmt::Display for ReconciliationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconciliationMethod::FinancePriority => "finance_priority",
            ReconciliationMethod::SalesPriority => "sales_priority",
            ReconciliationMethod::WeightedAverage => "weighted_average",
        };
        f.write_str(s)
    }
}

impl FromStr for ReconciliationMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "finance_priority" => Ok(ReconciliationMethod::FinancePriority),
            "sales_priority" => Ok(ReconciliationMethod::SalesPriority),
            "weighted_average" => Ok(ReconciliationMethod::WeightedAverage),
            other => Err(ForecastError::invalid(
                "method",
                format!(
                    "Unknown reconciliation method '{other}' (expected finance_priority, sales_priority or weighted_average)"
                ),
            )),
        }
    }
}

/// Handling of periods present on only one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPeriods {
    /// Inner join: the period is left out of the records
    #[default]
    Drop,
    /// The missing side counts as zero
    ZeroFill,
}

/// Method, weight and join policy. Stored in `ForecastConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationSettings {
    pub method: ReconciliationMethod,
    pub finance_weight: Rate,
    pub unmatched: UnmatchedPeriods,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            method: ReconciliationMethod::WeightedAverage,
            finance_weight: default_finance_weight(),
            unmatched: UnmatchedPeriods::Drop,
        }
    }
}

impl ReconciliationSettings {
    pub fn validate(&self) -> ForecastResult<()> {
        if self.finance_weight < Decimal::ZERO || self.finance_weight > Decimal::ONE {
            return Err(ForecastError::invalid(
                "finance_weight",
                format!(
                    "Finance weight must be within [0, 1] (got {})",
                    self.finance_weight
                ),
            ));
        }
        Ok(())
    }
}

fn default_finance_weight() -> Rate {
    dec!(0.6)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileInput {
    pub finance: Vec<PeriodRevenue>,
    pub sales: Vec<PeriodRevenue>,
    #[serde(default)]
    pub method: ReconciliationMethod,
    #[serde(default = "default_finance_weight")]
    pub finance_weight: Rate,
    #[serde(default)]
    pub unmatched: UnmatchedPeriods,
}

impl ReconcileInput {
    pub fn new(
        finance: Vec<PeriodRevenue>,
        sales: Vec<PeriodRevenue>,
        settings: &ReconciliationSettings,
    ) -> Self {
        Self {
            finance,
            sales,
            method: settings.method,
            finance_weight: settings.finance_weight,
            unmatched: settings.unmatched,
        }
    }

    pub fn settings(&self) -> ReconciliationSettings {
        ReconciliationSettings {
            method: self.method,
            finance_weight: self.finance_weight,
            unmatched: self.unmatched,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    pub period_label: String,
    pub finance_revenue: Money,
    pub sales_revenue: Money,
    /// sales − finance
    pub variance_abs: Money,
    /// variance_abs / finance × 100, zero when finance is zero
    pub variance_pct: Percent,
    pub reconciled_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxVarianceMonth {
    pub period_label: String,
    pub variance: Money,
    pub variance_pct: Percent,
}

impl Default for MaxVarianceMonth {
    fn default() -> Self {
        Self {
            period_label: "N/A".into(),
            variance: Decimal::ZERO,
            variance_pct: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceTrend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarianceAnalysis {
    pub total_variance: Money,
    pub avg_variance_pct: Percent,
    pub max_variance_month: MaxVarianceMonth,
    pub high_variance_months: usize,
    pub medium_variance_months: usize,
    pub variance_trend: VarianceTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationOutput {
    pub method: ReconciliationMethod,
    pub finance_weight: Rate,
    pub records: Vec<ReconciliationRecord>,
    pub variance_analysis: VarianceAnalysis,
    pub finance_total: Money,
    pub sales_total: Money,
    pub reconciled_total: Money,
    /// Labels present on only one side
    pub unmatched_periods: Vec<String>,
}

impl ReconciliationOutput {
    fn zeroed(settings: &ReconciliationSettings, unmatched_periods: Vec<String>) -> Self {
        Self {
            method: settings.method,
            finance_weight: settings.finance_weight,
            records: Vec::new(),
            variance_analysis: VarianceAnalysis::default(),
            finance_total: Decimal::ZERO,
            sales_total: Decimal::ZERO,
            reconciled_total: Decimal::ZERO,
            unmatched_periods,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Merge Finance and Sales forecasts into one figure per period plus a
/// variance report.
///
/// Configuration is checked before any per-period work. Degenerate data
/// (an empty side, nothing to join) yields a zeroed result and a warning.
pub fn reconcile_forecasts(
    input: &ReconcileInput,
) -> ForecastResult<ComputationOutput<ReconciliationOutput>> {
    let start = Instant::now();
    let settings = input.settings();
    settings.validate()?;

    let mut warnings: Vec<String> = Vec::new();

    let finance = aggregate("finance", &input.finance, &mut warnings);
    let sales = aggregate("sales", &input.sales, &mut warnings);

    let assumptions = serde_json::json!({
        "method": settings.method,
        "finance_weight": settings.finance_weight,
        "unmatched": settings.unmatched,
    });

    if finance.is_empty() || sales.is_empty() {
        warnings.push("Finance or Sales forecast is empty; reconciliation is zeroed".into());
        log::warn!("reconcile: empty side (finance {}, sales {})", finance.len(), sales.len());
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            METHODOLOGY,
            &assumptions,
            warnings,
            elapsed,
            ReconciliationOutput::zeroed(&settings, Vec::new()),
        ));
    }

    let mut labels: Vec<&str> = finance
        .keys()
        .chain(sales.keys())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    sort_by_period(&mut labels, |label| *label);
    let mut unmatched_periods: Vec<String> = Vec::new();
    let mut records: Vec<ReconciliationRecord> = Vec::new();

    for label in labels {
        let (f, s) = match (finance.get(label), sales.get(label)) {
            (Some(f), Some(s)) => (*f, *s),
            (f, s) => {
                unmatched_periods.push(label.to_string());
                match settings.unmatched {
                    UnmatchedPeriods::Drop => continue,
                    UnmatchedPeriods::ZeroFill => (
                        f.copied().unwrap_or(Decimal::ZERO),
                        s.copied().unwrap_or(Decimal::ZERO),
                    ),
                }
            }
        };
        records.push(build_record(label, f, s, &settings));
    }

    if !unmatched_periods.is_empty() {
        let action = match settings.unmatched {
            UnmatchedPeriods::Drop => "dropped",
            UnmatchedPeriods::ZeroFill => "zero-filled",
        };
        warnings.push(format!(
            "{} period(s) present on only one side were {action}: {}",
            unmatched_periods.len(),
            unmatched_periods.join(", ")
        ));
    }

    if records.is_empty() {
        warnings.push("No common periods between Finance and Sales; reconciliation is zeroed".into());
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            METHODOLOGY,
            &assumptions,
            warnings,
            elapsed,
            ReconciliationOutput::zeroed(&settings, unmatched_periods),
        ));
    }

    let variance_analysis = analyze_variance(&records);
    let reconciled_total = records.iter().map(|r| r.reconciled_revenue).sum();
    log::debug!(
        "reconcile: {} periods via {}",
        records.len(),
        settings.method
    );

    let result = ReconciliationOutput {
        method: settings.method,
        finance_weight: settings.finance_weight,
        records,
        variance_analysis,
        finance_total: finance.values().copied().sum(),
        sales_total: sales.values().copied().sum(),
        reconciled_total,
        unmatched_periods,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Reconcile the two sides of a dual-perspective forecast.
pub fn reconcile_perspectives(
    dual: &DualPerspective,
    settings: &ReconciliationSettings,
) -> ForecastResult<ComputationOutput<ReconciliationOutput>> {
    let input = ReconcileInput::new(
        dual.finance.period_revenue(),
        dual.sales.period_revenue(),
        settings,
    );
    reconcile_forecasts(&input)
}

/// Variance statistics over reconciliation records.
pub fn analyze_variance(records: &[ReconciliationRecord]) -> VarianceAnalysis {
    if records.is_empty() {
        return VarianceAnalysis::default();
    }

    let pcts: Vec<Percent> = records.iter().map(|r| r.variance_pct).collect();

    let mut max_record = &records[0];
    for r in &records[1..] {
        if r.variance_abs.abs() > max_record.variance_abs.abs() {
            max_record = r;
        }
    }

    let high_variance_months = pcts.iter().filter(|p| p.abs() > HIGH_VARIANCE_PCT).count();
    let medium_variance_months = pcts
        .iter()
        .filter(|p| p.abs() > MEDIUM_VARIANCE_PCT && p.abs() <= HIGH_VARIANCE_PCT)
        .count();

    let variance_trend = match (pcts.first(), pcts.last()) {
        (Some(first), Some(last)) if pcts.len() >= 2 => {
            if last > first {
                VarianceTrend::Increasing
            } else {
                VarianceTrend::Decreasing
            }
        }
        _ => VarianceTrend::Stable,
    };

    VarianceAnalysis {
        total_variance: records.iter().map(|r| r.variance_abs).sum(),
        avg_variance_pct: mean(&pcts),
        max_variance_month: MaxVarianceMonth {
            period_label: max_record.period_label.clone(),
            variance: max_record.variance_abs,
            variance_pct: max_record.variance_pct,
        },
        high_variance_months,
        medium_variance_months,
        variance_trend,
    }
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

const METHODOLOGY: &str =
    "Period-by-period Finance/Sales reconciliation with variance analysis";

/// Sum rows per trimmed label; blank labels are skipped.
fn aggregate<'a>(
    side: &str,
    rows: &'a [PeriodRevenue],
    warnings: &mut Vec<String>,
) -> BTreeMap<&'a str, Money> {
    let mut buckets: BTreeMap<&str, Money> = BTreeMap::new();
    let mut blank = 0usize;
    for row in rows {
        let label = row.period_label.trim();
        if label.is_empty() {
            blank += 1;
            continue;
        }
        *buckets.entry(label).or_insert(Decimal::ZERO) += row.revenue;
    }
    if blank > 0 {
        warnings.push(format!("{blank} {side} row(s) with a blank period label were ignored"));
    }
    buckets
}

fn build_record(
    label: &str,
    finance: Money,
    sales: Money,
    settings: &ReconciliationSettings,
) -> ReconciliationRecord {
    let variance_abs = sales - finance;
    ReconciliationRecord {
        period_label: label.to_string(),
        finance_revenue: finance,
        sales_revenue: sales,
        variance_abs,
        variance_pct: safe_pct(variance_abs, finance),
        reconciled_revenue: settings
            .method
            .reconcile(finance, sales, settings.finance_weight),
    }
}
