use serde::{Deserialize, Serialize};

use crate::perspectives::PerspectiveConfig;
use crate::reconciliation::ReconciliationSettings;
use crate::risk::{RiskFactor, RiskFactorCatalog};
use crate::ForecastResult;

/// Exportable forecasting settings: perspective biases, reconciliation
/// policy and the risk factor catalog.
///
/// Missing sections fall back to their defaults, so a config file only needs
/// the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub perspectives: PerspectiveConfig,
    pub reconciliation: ReconciliationSettings,
    pub risk_factors: Vec<RiskFactor>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            perspectives: PerspectiveConfig::default(),
            reconciliation: ReconciliationSettings::default(),
            risk_factors: RiskFactorCatalog::new().factors().to_vec(),
        }
    }
}

impl ForecastConfig {
    /// Snapshot the current settings and catalog.
    pub fn from_parts(
        perspectives: &PerspectiveConfig,
        reconciliation: &ReconciliationSettings,
        catalog: &RiskFactorCatalog,
    ) -> Self {
        Self {
            perspectives: perspectives.clone(),
            reconciliation: *reconciliation,
            risk_factors: catalog.factors().to_vec(),
        }
    }

    pub fn validate(&self) -> ForecastResult<()> {
        self.perspectives.validate()?;
        self.reconciliation.validate()?;
        self.catalog().map(|_| ())
    }

    /// Catalog built from `risk_factors`, validating each factor.
    pub fn catalog(&self) -> ForecastResult<RiskFactorCatalog> {
        RiskFactorCatalog::from_factors(self.risk_factors.clone())
    }

    /// Parse and validate an exported config.
    pub fn from_json(json: &str) -> ForecastResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::debug!(
            "config: loaded {} risk factors",
            config.risk_factors.len()
        );
        Ok(config)
    }

    pub fn to_json(&self) -> ForecastResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
