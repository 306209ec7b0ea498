pub mod assumptions;
pub mod comparison;
pub mod projector;
pub mod scenario_store;

pub use assumptions::{AssumptionOverrides, ScenarioAssumptions, BASE_CASE, CONSERVATIVE, OPTIMISTIC};
pub use comparison::{compare_scenarios, ComparisonInput, ScenarioComparison, ScenarioComparisonRow};
pub use projector::{
    calculate_growth_metrics, combine_historical_and_forecast, forecast_revenue,
    period_multiplier, project_revenue, ForecastInput, ForecastPoint, GrowthMetrics,
};
pub use scenario_store::{Scenario, ScenarioStore};
