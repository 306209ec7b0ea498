use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{ImpactType, RiskFactor, RiskFactorCatalog};
use crate::error::ForecastError;
use crate::projection::ForecastPoint;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    Optimistic,
    Pessimistic,
    MostLikely,
}

impl ScenarioType {
    /// Value taken from a factor's range for this scenario.
    pub fn pick_value(self, factor: &RiskFactor) -> Rate {
        let is_multiplier = factor.impact_type == ImpactType::Multiplier;
        match self {
            ScenarioType::Optimistic => {
                if is_multiplier {
                    factor.min_value
                } else {
                    factor.max_value
                }
            }
            ScenarioType::Pessimistic => {
                if is_multiplier && factor.max_value < Decimal::ONE {
                    factor.max_value
                } else {
                    factor.min_value
                }
            }
            ScenarioType::MostLikely => factor.base_value,
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioType::Optimistic => "optimistic",
            ScenarioType::Pessimistic => "pessimistic",
            ScenarioType::MostLikely => "most_likely",
        };
        f.write_str(s)
    }
}

impl FromStr for ScenarioType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "optimistic" => Ok(ScenarioType::Optimistic),
            "pessimistic" => Ok(ScenarioType::Pessimistic),
            "most_likely" => Ok(ScenarioType::MostLikely),
            other => Err(ForecastError::invalid(
                "scenario_type",
                format!("Unknown risk scenario type '{other}'"),
            )),
        }
    }
}

/// Input for the risk-adjusted scenario bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScenarioInput {
    pub base_forecast: Vec<ForecastPoint>,
    /// Dimension tags selecting applicable factors (e.g. `offering`)
    #[serde(default)]
    pub dimensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskScenarioTotals {
    pub base: Money,
    pub optimistic: Money,
    pub pessimistic: Money,
    pub most_likely: Money,
}

/// Base forecast plus its three risk-adjusted variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScenarioSet {
    pub base: Vec<ForecastPoint>,
    pub optimistic: Vec<ForecastPoint>,
    pub pessimistic: Vec<ForecastPoint>,
    pub most_likely: Vec<ForecastPoint>,
    pub applied_factors: Vec<String>,
    pub totals: RiskScenarioTotals,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply `factors` in order to every point of `base_forecast`.
///
/// Factors do not commute once additive or probability impacts are mixed
/// in, so the slice order is the composition order. Revenue is floored at
/// zero after composition.
pub fn apply_risk_scenario(
    base_forecast: &[ForecastPoint],
    factors: &[&RiskFactor],
    scenario_type: ScenarioType,
) -> Vec<ForecastPoint> {
    base_forecast
        .iter()
        .map(|point| {
            let revenue = factors
                .iter()
                .fold(point.revenue, |r, f| {
                    f.impact_type.apply(r, scenario_type.pick_value(f))
                })
                .max(Decimal::ZERO);
            ForecastPoint {
                revenue,
                scenario_name: format!("{} ({scenario_type})", point.scenario_name),
                ..point.clone()
            }
        })
        .collect()
}

/// Optimistic, pessimistic and most-likely variants of a base forecast using
/// the catalog factors applicable to `input.dimensions`.
pub fn generate_risk_scenarios(
    input: &RiskScenarioInput,
    catalog: &RiskFactorCatalog,
) -> ForecastResult<ComputationOutput<RiskScenarioSet>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.base_forecast.is_empty() {
        warnings.push("Base forecast is empty; risk scenarios are empty".into());
    }

    let factors = catalog.applicable(input.dimensions.as_slice());
    if factors.is_empty() {
        warnings.push("No applicable risk factors; variants equal the base forecast".into());
    }
    log::debug!(
        "risk scenarios: {} points, {} factors",
        input.base_forecast.len(),
        factors.len()
    );

    let optimistic = apply_risk_scenario(&input.base_forecast, &factors, ScenarioType::Optimistic);
    let pessimistic =
        apply_risk_scenario(&input.base_forecast, &factors, ScenarioType::Pessimistic);
    let most_likely =
        apply_risk_scenario(&input.base_forecast, &factors, ScenarioType::MostLikely);

    let totals = RiskScenarioTotals {
        base: total(&input.base_forecast),
        optimistic: total(&optimistic),
        pessimistic: total(&pessimistic),
        most_likely: total(&most_likely),
    };

    let result = RiskScenarioSet {
        base: input.base_forecast.clone(),
        optimistic,
        pessimistic,
        most_likely,
        applied_factors: factors.iter().map(|f| f.name.clone()).collect(),
        totals,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Ordered risk factor composition (multiplier, additive, probability impacts)",
        &serde_json::json!({
            "dimensions": input.dimensions,
            "factors": factors,
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn total(points: &[ForecastPoint]) -> Money {
    points.iter().map(|p| p.revenue).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::catalog::RiskCategory;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn point(month: u32, revenue: Decimal) -> ForecastPoint {
        ForecastPoint {
            period_date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            period_label: format!("2024-{month:02}"),
            revenue,
            scenario_name: "Base Case".into(),
            is_forecast: true,
            quarter: (month - 1) / 3 + 1,
            year: 2024,
        }
    }

    fn forecast() -> Vec<ForecastPoint> {
        vec![point(1, dec!(100)), point(2, dec!(200)), point(3, dec!(0))]
    }

    fn factor(name: &str, impact_type: ImpactType, base: Decimal, min: Decimal, max: Decimal) -> RiskFactor {
        RiskFactor {
            name: name.into(),
            category: RiskCategory::Market,
            impact_type,
            base_value: base,
            min_value: min,
            max_value: max,
            description: String::new(),
            applies_to: vec!["all".into()],
        }
    }

    #[test]
    fn test_most_likely_with_unit_multipliers_is_identity() {
        let a = factor("A", ImpactType::Multiplier, dec!(1.0), dec!(0.7), dec!(1.3));
        let b = factor("B", ImpactType::Multiplier, dec!(1.0), dec!(0.9), dec!(1.1));
        let base = forecast();
        let out = apply_risk_scenario(&base, &[&a, &b], ScenarioType::MostLikely);
        for (before, after) in base.iter().zip(&out) {
            assert_eq!(before.revenue, after.revenue);
            assert_eq!(before.period_date, after.period_date);
        }
    }

    #[test]
    fn test_value_selection() {
        let mult = factor("M", ImpactType::Multiplier, dec!(0.95), dec!(0.8), dec!(1.0));
        let high_mult = factor("H", ImpactType::Multiplier, dec!(1.0), dec!(0.7), dec!(1.3));
        let add = factor("T", ImpactType::Additive, dec!(0), dec!(-0.2), dec!(0.1));

        assert_eq!(ScenarioType::Optimistic.pick_value(&mult), dec!(0.8));
        assert_eq!(ScenarioType::Optimistic.pick_value(&add), dec!(0.1));
        // max below 1: pessimistic takes the max
        assert_eq!(ScenarioType::Pessimistic.pick_value(&mult), dec!(1.0));
        assert_eq!(ScenarioType::Pessimistic.pick_value(&high_mult), dec!(0.7));
        assert_eq!(ScenarioType::Pessimistic.pick_value(&add), dec!(-0.2));
        assert_eq!(ScenarioType::MostLikely.pick_value(&mult), dec!(0.95));
    }

    #[test]
    fn test_composition_and_naming() {
        let downturn = factor("D", ImpactType::Probability, dec!(0.2), dec!(0.1), dec!(0.4));
        let out = apply_risk_scenario(&forecast(), &[&downturn], ScenarioType::MostLikely);
        assert_eq!(out[0].revenue, dec!(90));
        assert_eq!(out[1].revenue, dec!(180));
        assert_eq!(out[0].scenario_name, "Base Case (most_likely)");
    }

    #[test]
    fn test_floor_at_zero() {
        let crash = factor("C", ImpactType::Additive, dec!(-1.5), dec!(-2), dec!(0));
        let out = apply_risk_scenario(&forecast(), &[&crash], ScenarioType::MostLikely);
        assert!(out.iter().all(|p| p.revenue == Decimal::ZERO));
    }

    #[test]
    fn test_generate_uses_applicable_factors() {
        let catalog = RiskFactorCatalog::new();
        let input = RiskScenarioInput {
            base_forecast: forecast(),
            dimensions: vec![],
        };
        let out = generate_risk_scenarios(&input, &catalog).unwrap();
        let set = &out.result;
        assert_eq!(
            set.applied_factors,
            vec!["Market Volatility".to_string(), "Currency Fluctuation".to_string()]
        );
        // Both "all" factors have base 1.0
        assert_eq!(set.totals.most_likely, set.totals.base);
        // optimistic: 0.7 * 0.85
        assert_eq!(set.totals.optimistic, dec!(300) * dec!(0.7) * dec!(0.85));
        assert_eq!(set.base.len(), 3);
    }

    #[test]
    fn test_scenario_type_parse() {
        assert_eq!("most likely".parse::<ScenarioType>().unwrap(), ScenarioType::MostLikely);
        assert_eq!("Pessimistic".parse::<ScenarioType>().unwrap(), ScenarioType::Pessimistic);
        assert!("wild".parse::<ScenarioType>().is_err());
    }
}
