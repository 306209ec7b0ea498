use revenue_forecast_core::calendar::FiscalCalendar;
use revenue_forecast_core::config::ForecastConfig;
use revenue_forecast_core::perspectives::{self, PerspectiveConfig, PerspectiveInput, ProjectMetadata};
use revenue_forecast_core::projection::{
    self, ComparisonInput, ForecastInput, ScenarioAssumptions, ScenarioStore,
};
use revenue_forecast_core::quality::{self, DataQualityInput, ScenarioSeries, ValidationInput};
use revenue_forecast_core::reconciliation::{self, ReconciliationSettings};
use revenue_forecast_core::risk::{self, RiskFactorCatalog, RiskScenarioInput, BUILTIN_FACTORS};
use revenue_forecast_core::series::{self, RevenueRecord, SeriesInput};
use revenue_forecast_core::Granularity;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

fn record(project: &str, period: &str, revenue: serde_json::Value) -> RevenueRecord {
    RevenueRecord {
        project_id: project.into(),
        period: Some(period.into()),
        revenue: Some(revenue),
    }
}

fn sample_records() -> Vec<RevenueRecord> {
    vec![
        record("A", "2024-01", json!(100)),
        record("A", "2024-02", json!("110")),
        record("B", "2024-02-15", json!("$50.00")),
    ]
}

fn forecast_input(periods: u32) -> ForecastInput {
    let history = series::build_historical_series(&SeriesInput::new(sample_records())).unwrap();
    ForecastInput {
        historical: history.result.points,
        assumptions: ScenarioAssumptions::base_case(),
        periods,
        scenario_name: "Base Case".into(),
        granularity: Granularity::Quarterly,
        calendar: FiscalCalendar::default(),
    }
}

// ===========================================================================
// Series -> projection
// ===========================================================================

#[test]
fn test_records_to_quarterly_forecast() {
    let history = series::build_historical_series(&SeriesInput::new(sample_records())).unwrap();
    let hist = &history.result;
    assert_eq!(hist.points.len(), 2);
    assert_eq!(hist.points[1].revenue, dec!(160));
    assert_eq!(hist.total_revenue, dec!(260));
    assert!(!hist.synthesized);

    let input = forecast_input(4);
    let out = projection::forecast_revenue(&input).unwrap();
    let points = &out.result;
    assert_eq!(points.len(), 4);
    // 160 * 1.05, three months after the last history month
    assert_eq!(points[0].revenue, dec!(168));
    assert_eq!(points[0].period_label, "2024Q2");
    assert_eq!(points[1].revenue, dec!(176.4));
    assert!(points.windows(2).all(|w| w[1].revenue > w[0].revenue));
}

#[test]
fn test_combined_series_growth() {
    let input = forecast_input(2);
    let out = projection::forecast_revenue(&input).unwrap();
    let combined = projection::combine_historical_and_forecast(
        &input.historical,
        &out.result,
        &input.scenario_name,
    );
    assert_eq!(combined.len(), 4);
    assert!(!combined[0].is_forecast);
    assert!(combined[3].is_forecast);

    let growth = projection::calculate_growth_metrics(&combined);
    assert_eq!(growth.final_revenue, dec!(176.4));
    // 100 -> 176.4
    assert_eq!(growth.total_growth, dec!(76.4));
    assert_eq!(growth.max_growth_rate, dec!(60));
}

#[test]
fn test_scenario_comparison_matches_single_forecasts() {
    let history = forecast_input(0).historical;
    let store = ScenarioStore::new();
    let input = ComparisonInput {
        historical: history,
        scenario_names: vec!["Base Case".into(), "Conservative".into()],
        periods: 4,
        granularity: Granularity::Quarterly,
        calendar: FiscalCalendar::default(),
    };
    let out = projection::compare_scenarios(&store, &input).unwrap();
    assert_eq!(out.result.rows.len(), 2);

    let single = projection::forecast_revenue(&forecast_input(4)).unwrap();
    let base = &out.result.rows[0];
    let revenues: Vec<Decimal> = base.periods.iter().map(|p| p.revenue).collect();
    let expected: Vec<Decimal> = single.result.iter().map(|p| p.revenue).collect();
    assert_eq!(revenues, expected);
    assert_eq!(base.periods[0].period_label, "2024Q2");
    assert!(out.result.rows[1].total_revenue < base.total_revenue);
}

// ===========================================================================
// Projection -> risk scenarios
// ===========================================================================

#[test]
fn test_forecast_feeds_risk_scenarios() {
    let forecast = projection::forecast_revenue(&forecast_input(4)).unwrap().result;
    let input = RiskScenarioInput {
        base_forecast: forecast,
        dimensions: vec![],
    };
    let out = risk::generate_risk_scenarios(&input, &RiskFactorCatalog::new()).unwrap();
    let set = &out.result;

    assert_eq!(
        set.applied_factors,
        vec!["Market Volatility".to_string(), "Currency Fluctuation".to_string()]
    );
    // Both portfolio-wide factors have a base value of 1.0
    assert_eq!(set.totals.most_likely, set.totals.base);
    // 0.7 * 0.85 from the lower bounds
    assert_eq!(set.totals.pessimistic, set.totals.base * dec!(0.595));
    assert!(set
        .pessimistic
        .iter()
        .chain(&set.optimistic)
        .all(|p| p.revenue >= Decimal::ZERO));
}

// ===========================================================================
// Project series -> perspectives -> reconciliation
// ===========================================================================

#[test]
fn test_perspectives_reconcile_end_to_end() {
    let records = vec![
        record("A", "2024-01", json!(100)),
        record("P", "2024-01", json!(50)),
    ];
    let rows = series::build_project_series(&SeriesInput::new(records)).unwrap();
    assert_eq!(rows.result.len(), 2);

    let input = PerspectiveInput {
        base: rows.result,
        projects: vec![
            ProjectMetadata {
                project_id: "A".into(),
                status: "Active".into(),
                client: "Existing Client".into(),
                offering: "Core Services".into(),
            },
            ProjectMetadata {
                project_id: "P".into(),
                status: "Pipeline".into(),
                client: "Newco".into(),
                offering: "Beta".into(),
            },
        ],
        config: PerspectiveConfig::default(),
    };
    let dual = perspectives::generate_perspectives(&input).unwrap();
    assert_eq!(dual.result.finance.total_revenue, dec!(76.5));

    let out = reconciliation::reconcile_perspectives(&dual.result, &ReconciliationSettings::default())
        .unwrap();
    let r = &out.result;
    assert_eq!(r.records.len(), 1);
    assert_eq!(r.finance_total, dec!(76.5));
    assert_eq!(r.sales_total, dec!(163.0125));
    // 0.6 * 76.5 + 0.4 * 163.0125
    assert_eq!(r.reconciled_total, dec!(111.105));
    assert!(r.unmatched_periods.is_empty());
}

// ===========================================================================
// Quality over produced scenarios
// ===========================================================================

#[test]
fn test_validation_over_forecast_scenario() {
    let forecast = projection::forecast_revenue(&forecast_input(4)).unwrap().result;
    let history = series::build_project_series(&SeriesInput::new(sample_records()))
        .unwrap()
        .result;

    let input = ValidationInput {
        data: DataQualityInput {
            records: sample_records(),
            projects: vec![],
            calendar: FiscalCalendar::default(),
        },
        history,
        scenarios: vec![ScenarioSeries::from_forecast("Base Case", Decimal::ONE, &forecast)],
    };
    let out = quality::generate_validation_report(&input).unwrap();
    let report = &out.result;

    assert!(report.data_quality.overall_score <= 100);
    assert_eq!(report.confidence_scores.len(), 1);
    let score = report.confidence_scores[0].overall_score;
    assert!(score >= Decimal::ZERO && score <= dec!(100));
    assert!(report.anomalies.is_empty());
    assert!(!report.recommendations.is_empty());
}

#[test]
fn test_accuracy_of_forecast_against_actuals() {
    let forecast = projection::forecast_revenue(&forecast_input(2)).unwrap().result;
    let predicted: Vec<Decimal> = forecast.iter().map(|p| p.revenue).collect();
    let input = quality::AccuracyInput {
        actual: vec![dec!(160), dec!(180)],
        predicted,
    };
    let out = quality::forecast_accuracy(&input).unwrap();
    // errors 8 and -3.6
    assert_eq!(out.result.mae, dec!(5.8));
    assert_eq!(out.result.bias, dec!(2.2));
    assert_eq!(out.result.directional_accuracy, dec!(100));
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn test_default_config_round_trip_keeps_catalog() {
    let json = ForecastConfig::default().to_json().unwrap();
    let loaded = ForecastConfig::from_json(&json).unwrap();
    let catalog = loaded.catalog().unwrap();
    assert_eq!(catalog.names(), BUILTIN_FACTORS.to_vec());
    assert_eq!(loaded.reconciliation, ReconciliationSettings::default());
}
