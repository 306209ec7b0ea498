use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::assumptions::{ScenarioAssumptions, BASE_CASE};
use crate::calendar::{add_months, FiscalCalendar};
use crate::series::HistoricalPoint;
use crate::stats::{mean, population_std_dev, safe_pct};
use crate::types::{with_metadata, ComputationOutput, Granularity, Money, Percent};
use crate::ForecastResult;

/// Floor of the new-customer decay curve.
const MIN_NEW_CUSTOMER_DECAY: Decimal = dec!(0.3);
/// Decay of the new-customer effect per forecast period.
const NEW_CUSTOMER_DECAY_STEP: Decimal = dec!(0.1);
/// Share of the seasonal adjustment applied in Q2/Q3.
const MID_YEAR_SEASONAL_SHARE: Decimal = dec!(0.3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single point of a scenario series (historical or projected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_date: NaiveDate,
    pub period_label: String,
    pub revenue: Money,
    pub scenario_name: String,
    pub is_forecast: bool,
    pub quarter: u32,
    pub year: i32,
}

impl ForecastPoint {
    /// Republish a historical point for display next to forecast points.
    pub fn from_historical(point: &HistoricalPoint, scenario_name: &str) -> Self {
        Self {
            period_date: point.period_date,
            period_label: point.period_label.clone(),
            revenue: point.revenue,
            scenario_name: scenario_name.to_string(),
            is_forecast: false,
            quarter: point.quarter,
            year: point.year,
        }
    }
}

/// Input for a single-scenario projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastInput {
    /// Ordered historical series; the last point seeds the projection
    pub historical: Vec<HistoricalPoint>,
    #[serde(default)]
    pub assumptions: ScenarioAssumptions,
    /// Number of periods to project
    #[serde(default = "default_periods")]
    pub periods: u32,
    #[serde(default = "default_scenario_name")]
    pub scenario_name: String,
    /// Spacing of forecast periods (quarterly unless stated)
    #[serde(default = "default_forecast_granularity")]
    pub granularity: Granularity,
    #[serde(default)]
    pub calendar: FiscalCalendar,
}

fn default_periods() -> u32 {
    8
}

fn default_scenario_name() -> String {
    BASE_CASE.to_string()
}

fn default_forecast_granularity() -> Granularity {
    Granularity::Quarterly
}

/// Period-over-period growth statistics of a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub avg_growth_rate: Percent,
    pub max_growth_rate: Percent,
    pub min_growth_rate: Percent,
    /// Population standard deviation of the growth rates
    pub volatility: Percent,
    pub final_revenue: Money,
    /// First to last point
    pub total_growth: Percent,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Combined multiplier applied to the prior period's revenue.
///
/// Growth and existing-customer effects are sustained; the new-customer
/// effect decays by 0.1 per period down to 0.3; seasonality lifts Q4,
/// depresses Q1 and applies 30% of the adjustment in Q2/Q3.
pub fn period_multiplier(
    assumptions: &ScenarioAssumptions,
    quarter: u32,
    period_index: u32,
) -> Decimal {
    let hundred = dec!(100);
    let growth_factor = Decimal::ONE + assumptions.growth_rate / hundred;

    let seasonal_base = assumptions.seasonal_adjustment / hundred;
    let seasonal_factor = match quarter {
        4 => Decimal::ONE + seasonal_base,
        1 => Decimal::ONE - seasonal_base,
        _ => Decimal::ONE + seasonal_base * MID_YEAR_SEASONAL_SHARE,
    };

    let market_factor = Decimal::ONE + assumptions.market_share_delta / hundred;

    let decay = (Decimal::ONE - NEW_CUSTOMER_DECAY_STEP * Decimal::from(period_index))
        .max(MIN_NEW_CUSTOMER_DECAY);
    let new_customer_factor = Decimal::ONE + assumptions.new_customer_growth / hundred * decay;

    let existing_customer_factor =
        Decimal::ONE + assumptions.existing_customer_growth / hundred;

    growth_factor * seasonal_factor * market_factor * new_customer_factor * existing_customer_factor
}

/// Project `periods` points forward from the last historical point.
///
/// Each period chains from the previous period's revenue and is floored at
/// zero. An empty history yields an empty projection.
pub fn project_revenue(
    historical: &[HistoricalPoint],
    assumptions: &ScenarioAssumptions,
    periods: u32,
    scenario_name: &str,
    granularity: Granularity,
    calendar: &FiscalCalendar,
) -> Vec<ForecastPoint> {
    let Some(last) = historical.last() else {
        return Vec::new();
    };

    let step = granularity.months();
    let mut revenue = last.revenue;
    let mut points = Vec::with_capacity(periods as usize);

    for i in 1..=periods {
        let Some(date) = add_months(last.period_date, step * i) else {
            break;
        };
        let quarter = calendar.quarter_of(date);
        revenue = (revenue * period_multiplier(assumptions, quarter, i)).max(Decimal::ZERO);

        points.push(ForecastPoint {
            period_date: date,
            period_label: calendar.label(date, granularity),
            revenue,
            scenario_name: scenario_name.to_string(),
            is_forecast: true,
            quarter,
            year: calendar.fiscal_year_of(date),
        });
    }

    points
}

/// Forecast revenue for one named scenario.
pub fn forecast_revenue(
    input: &ForecastInput,
) -> ForecastResult<ComputationOutput<Vec<ForecastPoint>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.calendar.validate()?;

    if input.historical.is_empty() {
        warnings.push("Historical series is empty; cannot forecast".into());
        log::warn!("forecast '{}': empty history", input.scenario_name);
    } else if input.periods == 0 {
        warnings.push("Zero forecast periods requested".into());
    }

    if input
        .historical
        .windows(2)
        .any(|w| w[1].period_date < w[0].period_date)
    {
        warnings.push(
            "Historical series is not in date order; projection seeds from the last element"
                .into(),
        );
    }

    let points = project_revenue(
        &input.historical,
        &input.assumptions,
        input.periods,
        &input.scenario_name,
        input.granularity,
        &input.calendar,
    );

    log::debug!(
        "forecast '{}': {} periods projected",
        input.scenario_name,
        points.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Compounding multiplicative revenue projection (growth, seasonality, market share, customer effects)",
        &serde_json::json!({
            "scenario": input.scenario_name,
            "periods": input.periods,
            "granularity": input.granularity,
            "assumptions": input.assumptions,
        }),
        warnings,
        elapsed,
        points,
    ))
}

/// Concatenate historical and forecast points, ordered by date.
pub fn combine_historical_and_forecast(
    historical: &[HistoricalPoint],
    forecast: &[ForecastPoint],
    scenario_name: &str,
) -> Vec<ForecastPoint> {
    let mut combined: Vec<ForecastPoint> = historical
        .iter()
        .map(|p| ForecastPoint::from_historical(p, scenario_name))
        .chain(forecast.iter().cloned())
        .collect();
    combined.sort_by_key(|p| p.period_date);
    combined
}

/// Growth statistics over consecutive points. Fewer than two points gives
/// all-zero metrics.
pub fn calculate_growth_metrics(points: &[ForecastPoint]) -> GrowthMetrics {
    if points.len() < 2 {
        return GrowthMetrics::default();
    }

    let revenues: Vec<Money> = points.iter().map(|p| p.revenue).collect();
    let growth_rates: Vec<Percent> = revenues
        .windows(2)
        .filter(|w| !w[0].is_zero())
        .map(|w| safe_pct(w[1] - w[0], w[0]))
        .collect();

    let first = revenues[0];
    let last = revenues[revenues.len() - 1];

    GrowthMetrics {
        avg_growth_rate: mean(&growth_rates),
        max_growth_rate: growth_rates.iter().copied().max().unwrap_or(Decimal::ZERO),
        min_growth_rate: growth_rates.iter().copied().min().unwrap_or(Decimal::ZERO),
        volatility: population_std_dev(&growth_rates),
        final_revenue: last,
        total_growth: safe_pct(last - first, first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn quarterly_history() -> Vec<HistoricalPoint> {
        [(1, dec!(100)), (4, dec!(102)), (7, dec!(98)), (10, dec!(110))]
            .iter()
            .enumerate()
            .map(|(i, (month, revenue))| HistoricalPoint {
                period_date: d(2023, *month),
                period_label: format!("2023Q{}", i + 1),
                revenue: *revenue,
                quarter: i as u32 + 1,
                year: 2023,
            })
            .collect()
    }

    fn input(assumptions: ScenarioAssumptions, periods: u32) -> ForecastInput {
        ForecastInput {
            historical: quarterly_history(),
            assumptions,
            periods,
            scenario_name: "Test".into(),
            granularity: Granularity::Quarterly,
            calendar: FiscalCalendar::default(),
        }
    }

    #[test]
    fn test_single_period_growth_only() {
        let out = forecast_revenue(&input(ScenarioAssumptions::base_case(), 1)).unwrap();
        let points = &out.result;
        assert_eq!(points.len(), 1);
        // 110 * 1.05 * (1 - 0) * 1 * 1 * 1
        assert_eq!(points[0].revenue, dec!(115.5));
        assert_eq!(points[0].quarter, 1);
        assert_eq!(points[0].year, 2024);
        assert_eq!(points[0].period_label, "2024Q1");
        assert!(points[0].is_forecast);
    }

    #[test]
    fn test_chaining_compounds() {
        let out = forecast_revenue(&input(ScenarioAssumptions::base_case(), 3)).unwrap();
        let points = &out.result;
        assert_eq!(points[1].revenue, points[0].revenue * dec!(1.05));
        assert_eq!(points[2].revenue, points[1].revenue * dec!(1.05));
        assert_eq!(points[2].period_label, "2024Q3");
    }

    #[test]
    fn test_seasonality_by_quarter() {
        let a = ScenarioAssumptions {
            seasonal_adjustment: dec!(10),
            ..ScenarioAssumptions::flat()
        };
        assert_eq!(period_multiplier(&a, 4, 1), dec!(1.10));
        assert_eq!(period_multiplier(&a, 1, 1), dec!(0.90));
        assert_eq!(period_multiplier(&a, 2, 1), dec!(1.03));
        assert_eq!(period_multiplier(&a, 3, 1), dec!(1.03));
    }

    #[test]
    fn test_new_customer_effect_decays_to_floor() {
        let a = ScenarioAssumptions {
            new_customer_growth: dec!(10),
            ..ScenarioAssumptions::flat()
        };
        // decay 0.9 at period 1
        assert_eq!(period_multiplier(&a, 2, 1), dec!(1.09));
        // decay 0.5 at period 5
        assert_eq!(period_multiplier(&a, 2, 5), dec!(1.05));
        // floor of 0.3 from period 7 onwards
        assert_eq!(period_multiplier(&a, 2, 7), dec!(1.03));
        assert_eq!(period_multiplier(&a, 2, 20), dec!(1.03));
    }

    #[test]
    fn test_revenue_never_negative() {
        let a = ScenarioAssumptions {
            growth_rate: dec!(-250),
            ..ScenarioAssumptions::flat()
        };
        let out = forecast_revenue(&input(a, 4)).unwrap();
        assert!(out.result.iter().all(|p| p.revenue >= Decimal::ZERO));
        assert_eq!(out.result[0].revenue, Decimal::ZERO);
    }

    #[test]
    fn test_non_negative_across_canonical_scenarios() {
        for a in [
            ScenarioAssumptions::base_case(),
            ScenarioAssumptions::optimistic(),
            ScenarioAssumptions::conservative(),
        ] {
            let out = forecast_revenue(&input(a, 12)).unwrap();
            assert!(out.result.iter().all(|p| p.revenue >= Decimal::ZERO));
        }
    }

    #[test]
    fn test_deterministic() {
        let first = forecast_revenue(&input(ScenarioAssumptions::optimistic(), 8)).unwrap();
        let second = forecast_revenue(&input(ScenarioAssumptions::optimistic(), 8)).unwrap();
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn test_empty_history_cannot_forecast() {
        let mut i = input(ScenarioAssumptions::base_case(), 4);
        i.historical.clear();
        let out = forecast_revenue(&i).unwrap();
        assert!(out.result.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("cannot forecast")));
    }

    #[test]
    fn test_monthly_granularity_steps_one_month() {
        let mut i = input(ScenarioAssumptions::base_case(), 2);
        i.granularity = Granularity::Monthly;
        let out = forecast_revenue(&i).unwrap();
        assert_eq!(out.result[0].period_label, "2023-11");
        assert_eq!(out.result[1].period_label, "2023-12");
        assert_eq!(out.result[1].quarter, 4);
    }

    #[test]
    fn test_combine_marks_boundary() {
        let history = quarterly_history();
        let forecast = forecast_revenue(&input(ScenarioAssumptions::base_case(), 2))
            .unwrap()
            .result;
        let combined = combine_historical_and_forecast(&history, &forecast, "Test");
        assert_eq!(combined.len(), 6);
        assert!(combined[..4].iter().all(|p| !p.is_forecast));
        assert!(combined[4..].iter().all(|p| p.is_forecast));
        assert!(combined.windows(2).all(|w| w[0].period_date <= w[1].period_date));
        assert_eq!(combined[0].scenario_name, "Test");
    }

    #[test]
    fn test_growth_metrics() {
        let history = quarterly_history();
        let points: Vec<ForecastPoint> = history
            .iter()
            .map(|p| ForecastPoint::from_historical(p, "H"))
            .collect();
        let m = calculate_growth_metrics(&points);
        assert_eq!(m.final_revenue, dec!(110));
        assert_eq!(m.total_growth, dec!(10));
        assert_eq!(m.max_growth_rate, safe_pct(dec!(12), dec!(98)));
        assert_eq!(m.min_growth_rate, safe_pct(dec!(-4), dec!(102)));
    }

    #[test]
    fn test_growth_metrics_single_point_zeroed() {
        let points = vec![ForecastPoint::from_historical(&quarterly_history()[0], "H")];
        assert_eq!(calculate_growth_metrics(&points), GrowthMetrics::default());
    }
}
