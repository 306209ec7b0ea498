use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::projector::{calculate_growth_metrics, project_revenue, GrowthMetrics};
use super::scenario_store::ScenarioStore;
use crate::calendar::FiscalCalendar;
use crate::series::HistoricalPoint;
use crate::types::{with_metadata, ComputationOutput, Granularity, Money, PeriodRevenue};
use crate::ForecastResult;

/// Input for a side-by-side projection of several stored scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub historical: Vec<HistoricalPoint>,
    /// Scenarios to compare, in output order. Empty compares every stored
    /// scenario.
    #[serde(default)]
    pub scenario_names: Vec<String>,
    #[serde(default = "default_periods")]
    pub periods: u32,
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    #[serde(default)]
    pub calendar: FiscalCalendar,
}

fn default_periods() -> u32 {
    8
}

fn default_granularity() -> Granularity {
    Granularity::Quarterly
}

/// One scenario's projected revenue by period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonRow {
    pub scenario_name: String,
    pub periods: Vec<PeriodRevenue>,
    pub total_revenue: Money,
    pub growth_metrics: GrowthMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub rows: Vec<ScenarioComparisonRow>,
    /// Requested names that are not in the store
    pub unknown_scenarios: Vec<String>,
}

/// Project each requested scenario over the same history.
///
/// Unknown names are skipped with a warning; every row shares the same
/// period labels.
pub fn compare_scenarios(
    store: &ScenarioStore,
    input: &ComparisonInput,
) -> ForecastResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    input.calendar.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let names: Vec<&str> = if input.scenario_names.is_empty() {
        store.names()
    } else {
        input.scenario_names.iter().map(String::as_str).collect()
    };

    if input.historical.is_empty() {
        warnings.push("Historical series is empty; cannot forecast".into());
    }

    let mut comparison = ScenarioComparison::default();
    for name in names {
        let Some(scenario) = store.get(name) else {
            comparison.unknown_scenarios.push(name.to_string());
            continue;
        };
        let points = project_revenue(
            &input.historical,
            &scenario.assumptions,
            input.periods,
            name,
            input.granularity,
            &input.calendar,
        );
        comparison.rows.push(ScenarioComparisonRow {
            scenario_name: name.to_string(),
            total_revenue: points.iter().map(|p| p.revenue).sum(),
            growth_metrics: calculate_growth_metrics(&points),
            periods: points
                .into_iter()
                .map(|p| PeriodRevenue {
                    period_label: p.period_label,
                    revenue: p.revenue,
                })
                .collect(),
        });
    }

    if !comparison.unknown_scenarios.is_empty() {
        warnings.push(format!(
            "Unknown scenario(s) skipped: {}",
            comparison.unknown_scenarios.join(", ")
        ));
        log::warn!("compare: unknown scenarios {:?}", comparison.unknown_scenarios);
    }
    if comparison.rows.is_empty() {
        warnings.push("No scenario to compare".into());
    }
    log::debug!("compare: {} scenarios over {} periods", comparison.rows.len(), input.periods);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side scenario projection from a shared history",
        &serde_json::json!({
            "scenarios": input.scenario_names,
            "periods": input.periods,
            "granularity": input.granularity,
        }),
        warnings,
        elapsed,
        comparison,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{AssumptionOverrides, BASE_CASE, CONSERVATIVE, OPTIMISTIC};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn history() -> Vec<HistoricalPoint> {
        vec![HistoricalPoint {
            period_date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            period_label: "2024Q4".into(),
            revenue: dec!(1000),
            quarter: 4,
            year: 2024,
        }]
    }

    fn input(names: &[&str]) -> ComparisonInput {
        ComparisonInput {
            historical: history(),
            scenario_names: names.iter().map(|n| n.to_string()).collect(),
            periods: 4,
            granularity: Granularity::Quarterly,
            calendar: FiscalCalendar::default(),
        }
    }

    #[test]
    fn test_all_scenarios_share_periods_and_rank() {
        let store = ScenarioStore::new();
        let out = compare_scenarios(&store, &input(&[])).unwrap();
        let rows = &out.result.rows;
        let names: Vec<&str> = rows.iter().map(|r| r.scenario_name.as_str()).collect();
        assert_eq!(names, vec![BASE_CASE, OPTIMISTIC, CONSERVATIVE]);

        let labels = |row: &ScenarioComparisonRow| -> Vec<String> {
            row.periods.iter().map(|p| p.period_label.clone()).collect()
        };
        assert_eq!(labels(&rows[0]), labels(&rows[1]));
        assert_eq!(labels(&rows[0]), vec!["2025Q1", "2025Q2", "2025Q3", "2025Q4"]);

        assert!(rows[1].total_revenue > rows[0].total_revenue);
        assert!(rows[0].total_revenue > rows[2].total_revenue);
        assert_eq!(
            rows[0].growth_metrics.final_revenue,
            rows[0].periods[3].revenue
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_unknown_names_skipped() {
        let store = ScenarioStore::new();
        let out = compare_scenarios(&store, &input(&[CONSERVATIVE, "Moonshot"])).unwrap();
        assert_eq!(out.result.rows.len(), 1);
        assert_eq!(out.result.rows[0].scenario_name, CONSERVATIVE);
        assert_eq!(out.result.unknown_scenarios, vec!["Moonshot".to_string()]);
        assert!(out.warnings.iter().any(|w| w.contains("Moonshot")));
    }

    #[test]
    fn test_custom_scenario_compared() {
        let mut store = ScenarioStore::new();
        let overrides = AssumptionOverrides {
            growth_rate: Some(dec!(0)),
            seasonal_adjustment: Some(dec!(0)),
            market_share_delta: Some(dec!(0)),
            new_customer_growth: Some(dec!(0)),
            existing_customer_growth: Some(dec!(0)),
        };
        store
            .create_scenario("Flat", "No change", BASE_CASE, &overrides)
            .unwrap();
        let out = compare_scenarios(&store, &input(&["Flat"])).unwrap();
        let row = &out.result.rows[0];
        assert!(row.periods.iter().all(|p| p.revenue == dec!(1000)));
        assert_eq!(row.total_revenue, dec!(4000));
        assert_eq!(row.growth_metrics.total_growth, dec!(0));
    }

    #[test]
    fn test_empty_history_and_bad_calendar() {
        let store = ScenarioStore::new();
        let mut empty = input(&[BASE_CASE]);
        empty.historical.clear();
        let out = compare_scenarios(&store, &empty).unwrap();
        assert!(out.result.rows[0].periods.is_empty());
        assert!(out.warnings.iter().any(|w| w.contains("cannot forecast")));

        let mut bad = input(&[]);
        bad.calendar.start_month = 13;
        assert!(compare_scenarios(&store, &bad).is_err());
    }
}
