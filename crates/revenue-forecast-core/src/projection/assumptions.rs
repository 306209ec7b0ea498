use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Percent;

pub const BASE_CASE: &str = "Base Case";
pub const OPTIMISTIC: &str = "Optimistic";
pub const CONSERVATIVE: &str = "Conservative";

/// Growth drivers of a scenario. Every field is in percent per period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumptions {
    pub growth_rate: Percent,
    pub seasonal_adjustment: Percent,
    #[serde(alias = "market_share")]
    pub market_share_delta: Percent,
    pub new_customer_growth: Percent,
    pub existing_customer_growth: Percent,
}

impl Default for ScenarioAssumptions {
    fn default() -> Self {
        Self::base_case()
    }
}

impl ScenarioAssumptions {
    pub fn base_case() -> Self {
        Self {
            growth_rate: dec!(5.0),
            seasonal_adjustment: Decimal::ZERO,
            market_share_delta: Decimal::ZERO,
            new_customer_growth: Decimal::ZERO,
            existing_customer_growth: Decimal::ZERO,
        }
    }

    pub fn optimistic() -> Self {
        Self {
            growth_rate: dec!(12.0),
            seasonal_adjustment: dec!(2.0),
            market_share_delta: dec!(3.0),
            new_customer_growth: dec!(15.0),
            existing_customer_growth: dec!(8.0),
        }
    }

    pub fn conservative() -> Self {
        Self {
            growth_rate: dec!(1.0),
            seasonal_adjustment: dec!(-1.0),
            market_share_delta: dec!(-1.0),
            new_customer_growth: dec!(-5.0),
            existing_customer_growth: dec!(-2.0),
        }
    }

    /// All drivers at zero: the projection repeats the last historical value.
    pub fn flat() -> Self {
        Self {
            growth_rate: Decimal::ZERO,
            seasonal_adjustment: Decimal::ZERO,
            market_share_delta: Decimal::ZERO,
            new_customer_growth: Decimal::ZERO,
            existing_customer_growth: Decimal::ZERO,
        }
    }

    /// Defaults for one of the canonical scenario names.
    pub fn canonical(name: &str) -> Option<Self> {
        match name {
            BASE_CASE => Some(Self::base_case()),
            OPTIMISTIC => Some(Self::optimistic()),
            CONSERVATIVE => Some(Self::conservative()),
            _ => None,
        }
    }

    /// A new record with the overridden fields replaced.
    pub fn with_overrides(&self, overrides: &AssumptionOverrides) -> Self {
        Self {
            growth_rate: overrides.growth_rate.unwrap_or(self.growth_rate),
            seasonal_adjustment: overrides
                .seasonal_adjustment
                .unwrap_or(self.seasonal_adjustment),
            market_share_delta: overrides
                .market_share_delta
                .unwrap_or(self.market_share_delta),
            new_customer_growth: overrides
                .new_customer_growth
                .unwrap_or(self.new_customer_growth),
            existing_customer_growth: overrides
                .existing_customer_growth
                .unwrap_or(self.existing_customer_growth),
        }
    }
}

/// Partial assumption set applied on top of a base scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_adjustment: Option<Percent>,
    #[serde(
        default,
        alias = "market_share",
        skip_serializing_if = "Option::is_none"
    )]
    pub market_share_delta: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_customer_growth: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_customer_growth: Option<Percent>,
}
