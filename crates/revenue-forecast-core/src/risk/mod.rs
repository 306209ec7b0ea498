pub mod catalog;
pub mod generator;

pub use catalog::{
    ImpactType, RiskCategory, RiskFactor, RiskFactorCatalog, RiskFactorUpdate, ALL_DIMENSIONS,
    BUILTIN_FACTORS,
};
pub use generator::{
    apply_risk_scenario, generate_risk_scenarios, RiskScenarioInput, RiskScenarioSet,
    RiskScenarioTotals, ScenarioType,
};
