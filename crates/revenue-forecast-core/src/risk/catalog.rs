use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::types::Rate;
use crate::ForecastResult;

/// Dimension tag matching every forecast slice.
pub const ALL_DIMENSIONS: &str = "all";

/// Names of the factors seeded by [`RiskFactorCatalog::new`]. These cannot
/// be removed.
pub const BUILTIN_FACTORS: [&str; 6] = [
    "Market Volatility",
    "Competitive Pressure",
    "Economic Downturn",
    "Execution Risk",
    "Currency Fluctuation",
    "Technology Disruption",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Market,
    Operational,
    Financial,
    Competitive,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskCategory::Market => "market",
            RiskCategory::Operational => "operational",
            RiskCategory::Financial => "financial",
            RiskCategory::Competitive => "competitive",
        };
        f.write_str(s)
    }
}

impl FromStr for RiskCategory {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(RiskCategory::Market),
            "operational" => Ok(RiskCategory::Operational),
            "financial" => Ok(RiskCategory::Financial),
            "competitive" => Ok(RiskCategory::Competitive),
            other => Err(ForecastError::invalid(
                "category",
                format!("Unknown risk category '{other}'"),
            )),
        }
    }
}

/// How a factor's value acts on revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    /// revenue × value
    Multiplier,
    /// revenue × (1 + value)
    Additive,
    /// revenue × (1 − 0.5 × value)
    Probability,
}

impl ImpactType {
    /// Apply a chosen factor value to a revenue figure.
    pub fn apply(self, revenue: Decimal, value: Rate) -> Decimal {
        match self {
            ImpactType::Multiplier => revenue * value,
            ImpactType::Additive => revenue * (Decimal::ONE + value),
            ImpactType::Probability => revenue * (Decimal::ONE - value * dec!(0.5)),
        }
    }
}

/// A named, bounded adjustment applied to a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub category: RiskCategory,
    pub impact_type: ImpactType,
    pub base_value: Rate,
    pub min_value: Rate,
    pub max_value: Rate,
    #[serde(default)]
    pub description: String,
    /// Dimension tags, or `"all"`
    pub applies_to: Vec<String>,
}

impl RiskFactor {
    pub fn validate(&self) -> ForecastResult<()> {
        if self.name.trim().is_empty() {
            return Err(ForecastError::invalid("name", "Risk factor name cannot be empty"));
        }
        if self.min_value > self.max_value {
            return Err(ForecastError::invalid(
                "min_value",
                format!(
                    "'{}': min_value {} exceeds max_value {}",
                    self.name, self.min_value, self.max_value
                ),
            ));
        }
        if self.base_value < self.min_value || self.base_value > self.max_value {
            return Err(ForecastError::invalid(
                "base_value",
                format!(
                    "'{}': base_value {} outside [{}, {}]",
                    self.name, self.base_value, self.min_value, self.max_value
                ),
            ));
        }
        if self.applies_to.is_empty() {
            return Err(ForecastError::invalid(
                "applies_to",
                format!("'{}': applies_to must name at least one dimension", self.name),
            ));
        }
        Ok(())
    }

    pub fn applies_to_all(&self) -> bool {
        self.applies_to.iter().any(|d| d == ALL_DIMENSIONS)
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_FACTORS.contains(&self.name.as_str())
    }
}

/// Partial edit of a risk factor. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFactorUpdate {
    pub category: Option<RiskCategory>,
    pub impact_type: Option<ImpactType>,
    pub base_value: Option<Rate>,
    pub min_value: Option<Rate>,
    pub max_value: Option<Rate>,
    pub description: Option<String>,
    pub applies_to: Option<Vec<String>>,
}

/// Ordered risk factor catalog. Composition order is catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactorCatalog {
    factors: Vec<RiskFactor>,
}

impl Default for RiskFactorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Catalog operations
// ---------------------------------------------------------------------------

impl RiskFactorCatalog {
    /// Catalog seeded with the six built-in factors.
    pub fn new() -> Self {
        Self {
            factors: default_factors(),
        }
    }

    /// Build a catalog from caller-supplied factors, validating each one.
    pub fn from_factors(factors: Vec<RiskFactor>) -> ForecastResult<Self> {
        let mut catalog = Self {
            factors: Vec::with_capacity(factors.len()),
        };
        for factor in factors {
            catalog.add(factor)?;
        }
        Ok(catalog)
    }

    pub fn factors(&self) -> &[RiskFactor] {
        &self.factors
    }

    pub fn names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.name == name)
    }

    pub fn add(&mut self, factor: RiskFactor) -> ForecastResult<&RiskFactor> {
        factor.validate()?;
        if self.get(&factor.name).is_some() {
            return Err(ForecastError::Duplicate {
                kind: "risk factor".into(),
                name: factor.name,
            });
        }
        log::debug!("risk catalog: added '{}'", factor.name);
        self.factors.push(factor);
        Ok(&self.factors[self.factors.len() - 1])
    }

    /// Apply `update` to a copy, validate the copy, then replace the stored
    /// record.
    pub fn update(&mut self, name: &str, update: &RiskFactorUpdate) -> ForecastResult<&RiskFactor> {
        let idx = self.index_of(name)?;
        let current = &self.factors[idx];
        let next = RiskFactor {
            name: current.name.clone(),
            category: update.category.unwrap_or(current.category),
            impact_type: update.impact_type.unwrap_or(current.impact_type),
            base_value: update.base_value.unwrap_or(current.base_value),
            min_value: update.min_value.unwrap_or(current.min_value),
            max_value: update.max_value.unwrap_or(current.max_value),
            description: update
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            applies_to: update
                .applies_to
                .clone()
                .unwrap_or_else(|| current.applies_to.clone()),
        };
        next.validate()?;
        self.factors[idx] = next;
        Ok(&self.factors[idx])
    }

    pub fn remove(&mut self, name: &str) -> ForecastResult<RiskFactor> {
        let idx = self.index_of(name)?;
        if self.factors[idx].is_builtin() {
            return Err(ForecastError::Protected {
                kind: "risk factor".into(),
                name: name.to_string(),
                action: "removed".into(),
            });
        }
        log::debug!("risk catalog: removed '{name}'");
        Ok(self.factors.remove(idx))
    }

    pub fn by_category(&self, category: RiskCategory) -> Vec<&RiskFactor> {
        self.factors
            .iter()
            .filter(|f| f.category == category)
            .collect()
    }

    /// Factors tagged `"all"` or any of `dimensions`, in catalog order.
    /// With no dimensions only the `"all"` factors apply.
    pub fn applicable<S: AsRef<str>>(&self, dimensions: &[S]) -> Vec<&RiskFactor> {
        self.factors
            .iter()
            .filter(|f| {
                f.applies_to_all()
                    || dimensions
                        .iter()
                        .any(|d| f.applies_to.iter().any(|tag| tag == d.as_ref()))
            })
            .collect()
    }

    fn index_of(&self, name: &str) -> ForecastResult<usize> {
        self.factors
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| ForecastError::not_found("risk factor", name))
    }
}

fn default_factors() -> Vec<RiskFactor> {
    let factor = |name: &str,
                  category,
                  impact_type,
                  (base, min, max): (Decimal, Decimal, Decimal),
                  description: &str,
                  applies_to: &str| RiskFactor {
        name: name.to_string(),
        category,
        impact_type,
        base_value: base,
        min_value: min,
        max_value: max,
        description: description.to_string(),
        applies_to: vec![applies_to.to_string()],
    };

    vec![
        factor(
            "Market Volatility",
            RiskCategory::Market,
            ImpactType::Multiplier,
            (dec!(1.0), dec!(0.7), dec!(1.3)),
            "General market volatility impact on revenue",
            ALL_DIMENSIONS,
        ),
        factor(
            "Competitive Pressure",
            RiskCategory::Competitive,
            ImpactType::Multiplier,
            (dec!(1.0), dec!(0.8), dec!(1.1)),
            "Competitive pricing pressure",
            "offering",
        ),
        factor(
            "Economic Downturn",
            RiskCategory::Market,
            ImpactType::Probability,
            (dec!(0.15), dec!(0.05), dec!(0.40)),
            "Probability of economic downturn affecting demand",
            "industry",
        ),
        factor(
            "Execution Risk",
            RiskCategory::Operational,
            ImpactType::Multiplier,
            (dec!(0.95), dec!(0.80), dec!(1.0)),
            "Risk of delivery and execution shortfalls",
            "sales_org",
        ),
        factor(
            "Currency Fluctuation",
            RiskCategory::Financial,
            ImpactType::Multiplier,
            (dec!(1.0), dec!(0.85), dec!(1.15)),
            "Foreign exchange impact on reported revenue",
            ALL_DIMENSIONS,
        ),
        factor(
            "Technology Disruption",
            RiskCategory::Market,
            ImpactType::Additive,
            (dec!(0.0), dec!(-0.20), dec!(0.10)),
            "Impact of technology shifts on offerings",
            "offering",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn custom_factor(name: &str) -> RiskFactor {
        RiskFactor {
            name: name.into(),
            category: RiskCategory::Operational,
            impact_type: ImpactType::Multiplier,
            base_value: dec!(1.0),
            min_value: dec!(0.9),
            max_value: dec!(1.1),
            description: String::new(),
            applies_to: vec!["region".into()],
        }
    }

    #[test]
    fn test_default_catalog_order() {
        let catalog = RiskFactorCatalog::new();
        assert_eq!(catalog.names(), BUILTIN_FACTORS.to_vec());
        let downturn = catalog.get("Economic Downturn").unwrap();
        assert_eq!(downturn.impact_type, ImpactType::Probability);
        assert_eq!(downturn.base_value, dec!(0.15));
    }

    #[test]
    fn test_defaults_satisfy_bounds() {
        for f in RiskFactorCatalog::new().factors() {
            assert!(f.validate().is_ok(), "{} invalid", f.name);
        }
    }

    #[test]
    fn test_add_rejects_bad_bounds_and_duplicates() {
        let mut catalog = RiskFactorCatalog::new();
        let mut bad = custom_factor("Bad");
        bad.base_value = dec!(2);
        assert!(catalog.add(bad).is_err());

        assert!(catalog.add(custom_factor("Market Volatility")).is_err());
        assert!(catalog.add(custom_factor("Regional Risk")).is_ok());
        assert_eq!(catalog.factors().len(), 7);
    }

    #[test]
    fn test_update_is_atomic() {
        let mut catalog = RiskFactorCatalog::new();
        let bad = RiskFactorUpdate {
            min_value: Some(dec!(1.2)),
            ..Default::default()
        };
        assert!(catalog.update("Market Volatility", &bad).is_err());
        assert_eq!(catalog.get("Market Volatility").unwrap().min_value, dec!(0.7));

        let good = RiskFactorUpdate {
            min_value: Some(dec!(0.6)),
            description: Some("Wider band".into()),
            ..Default::default()
        };
        let updated = catalog.update("Market Volatility", &good).unwrap();
        assert_eq!(updated.min_value, dec!(0.6));
        assert_eq!(updated.max_value, dec!(1.3));
        assert_eq!(updated.description, "Wider band");
    }

    #[test]
    fn test_remove_protects_builtins() {
        let mut catalog = RiskFactorCatalog::new();
        assert!(matches!(
            catalog.remove("Execution Risk"),
            Err(ForecastError::Protected { .. })
        ));
        catalog.add(custom_factor("Regional Risk")).unwrap();
        assert_eq!(catalog.remove("Regional Risk").unwrap().name, "Regional Risk");
        assert!(catalog.remove("Regional Risk").is_err());
    }

    #[test]
    fn test_by_category() {
        let catalog = RiskFactorCatalog::new();
        let market: Vec<&str> = catalog
            .by_category(RiskCategory::Market)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            market,
            vec!["Market Volatility", "Economic Downturn", "Technology Disruption"]
        );
    }

    #[test]
    fn test_applicable_filters_by_dimension() {
        let catalog = RiskFactorCatalog::new();
        let none: [&str; 0] = [];
        let all_only: Vec<&str> = catalog
            .applicable(&none[..])
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(all_only, vec!["Market Volatility", "Currency Fluctuation"]);

        let offering: Vec<&str> = catalog
            .applicable(&["offering", "offering"][..])
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            offering,
            vec![
                "Market Volatility",
                "Competitive Pressure",
                "Currency Fluctuation",
                "Technology Disruption"
            ]
        );
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Market".parse::<RiskCategory>().unwrap(), RiskCategory::Market);
        assert!("weather".parse::<RiskCategory>().is_err());
    }

    #[test]
    fn test_impact_application() {
        assert_eq!(ImpactType::Multiplier.apply(dec!(100), dec!(0.9)), dec!(90.0));
        assert_eq!(ImpactType::Additive.apply(dec!(100), dec!(-0.2)), dec!(80.0));
        assert_eq!(ImpactType::Probability.apply(dec!(100), dec!(0.4)), dec!(80.0));
    }
}
