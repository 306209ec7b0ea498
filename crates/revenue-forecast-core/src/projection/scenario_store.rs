use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::assumptions::{
    AssumptionOverrides, ScenarioAssumptions, BASE_CASE, CONSERVATIVE, OPTIMISTIC,
};
use crate::error::ForecastError;
use crate::ForecastResult;

/// A named, editable bundle of forecast assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub assumptions: ScenarioAssumptions,
    /// Scenario this one was derived from. Recorded only; edits to the base
    /// do not propagate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_scenario: Option<String>,
    pub created: DateTime<Utc>,
}

/// Ordered set of scenarios plus the active selection.
///
/// Every mutation replaces a whole `Scenario` record, so a reader holding a
/// clone never sees a half-applied edit.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioStore {
    scenarios: Vec<Scenario>,
    active: String,
}

impl Default for ScenarioStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioStore {
    /// Store seeded with Base Case, Optimistic and Conservative.
    pub fn new() -> Self {
        let now = Utc::now();
        let seed = |name: &str, description: &str, assumptions| Scenario {
            name: name.to_string(),
            description: description.to_string(),
            assumptions,
            base_scenario: None,
            created: now,
        };
        Self {
            scenarios: vec![
                seed(
                    BASE_CASE,
                    "Base case revenue forecast",
                    ScenarioAssumptions::base_case(),
                ),
                seed(
                    OPTIMISTIC,
                    "Aggressive growth scenario",
                    ScenarioAssumptions::optimistic(),
                ),
                seed(
                    CONSERVATIVE,
                    "Conservative growth scenario",
                    ScenarioAssumptions::conservative(),
                ),
            ],
            active: BASE_CASE.to_string(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn assumptions(&self, name: &str) -> ForecastResult<ScenarioAssumptions> {
        self.get(name)
            .map(|s| s.assumptions)
            .ok_or_else(|| ForecastError::not_found("scenario", name))
    }

    pub fn active(&self) -> &Scenario {
        self.get(&self.active)
            .or_else(|| self.get(BASE_CASE))
            .unwrap_or(&self.scenarios[0])
    }

    pub fn set_active(&mut self, name: &str) -> ForecastResult<&Scenario> {
        if self.get(name).is_none() {
            return Err(ForecastError::not_found("scenario", name));
        }
        self.active = name.to_string();
        Ok(self.active())
    }

    /// Derive a new scenario from `base` by copying its assumptions and
    /// applying `overrides`.
    pub fn create_scenario(
        &mut self,
        name: &str,
        description: &str,
        base: &str,
        overrides: &AssumptionOverrides,
    ) -> ForecastResult<&Scenario> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForecastError::invalid("name", "Scenario name cannot be empty"));
        }
        if self.get(name).is_some() {
            return Err(ForecastError::Duplicate {
                kind: "scenario".into(),
                name: name.to_string(),
            });
        }
        let base_assumptions = self.assumptions(base)?;

        self.scenarios.push(Scenario {
            name: name.to_string(),
            description: description.to_string(),
            assumptions: base_assumptions.with_overrides(overrides),
            base_scenario: Some(base.to_string()),
            created: Utc::now(),
        });
        log::debug!("scenario store: created '{name}' from '{base}'");
        Ok(&self.scenarios[self.scenarios.len() - 1])
    }

    /// Replace a scenario's assumptions with a complete new record.
    pub fn update_assumptions(
        &mut self,
        name: &str,
        assumptions: ScenarioAssumptions,
    ) -> ForecastResult<&Scenario> {
        let idx = self.index_of(name)?;
        let updated = Scenario {
            assumptions,
            ..self.scenarios[idx].clone()
        };
        self.scenarios[idx] = updated;
        Ok(&self.scenarios[idx])
    }

    /// Apply partial overrides by building the full record first, then
    /// replacing it.
    pub fn apply_overrides(
        &mut self,
        name: &str,
        overrides: &AssumptionOverrides,
    ) -> ForecastResult<&Scenario> {
        let next = self.assumptions(name)?.with_overrides(overrides);
        self.update_assumptions(name, next)
    }

    /// Reset a scenario to the Base Case defaults.
    pub fn reset_assumptions(&mut self, name: &str) -> ForecastResult<&Scenario> {
        self.update_assumptions(name, ScenarioAssumptions::base_case())
    }

    /// Delete a scenario. Base Case cannot be deleted; deleting the active
    /// scenario re-activates Base Case.
    pub fn delete_scenario(&mut self, name: &str) -> ForecastResult<Scenario> {
        if name == BASE_CASE {
            return Err(ForecastError::Protected {
                kind: "scenario".into(),
                name: name.to_string(),
                action: "deleted".into(),
            });
        }
        let idx = self.index_of(name)?;
        let removed = self.scenarios.remove(idx);
        if self.active == name {
            self.active = BASE_CASE.to_string();
        }
        log::debug!("scenario store: deleted '{name}'");
        Ok(removed)
    }

    fn index_of(&self, name: &str) -> ForecastResult<usize> {
        self.scenarios
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| ForecastError::not_found("scenario", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_seeded_in_order() {
        let store = ScenarioStore::new();
        assert_eq!(store.names(), vec![BASE_CASE, OPTIMISTIC, CONSERVATIVE]);
        assert_eq!(store.active().name, BASE_CASE);
        assert_eq!(
            store.assumptions(OPTIMISTIC).unwrap().growth_rate,
            dec!(12)
        );
    }

    #[test]
    fn test_create_scenario_copies_base() {
        let mut store = ScenarioStore::new();
        let overrides = AssumptionOverrides {
            growth_rate: Some(dec!(20)),
            ..Default::default()
        };
        let created = store
            .create_scenario("Stretch", "Stretch target", OPTIMISTIC, &overrides)
            .unwrap();
        assert_eq!(created.assumptions.growth_rate, dec!(20));
        assert_eq!(created.assumptions.new_customer_growth, dec!(15));
        assert_eq!(created.base_scenario.as_deref(), Some(OPTIMISTIC));
    }

    #[test]
    fn test_derivation_is_not_live() {
        let mut store = ScenarioStore::new();
        store
            .create_scenario("Copy", "", BASE_CASE, &AssumptionOverrides::default())
            .unwrap();
        store
            .update_assumptions(BASE_CASE, ScenarioAssumptions::optimistic())
            .unwrap();
        assert_eq!(
            store.assumptions("Copy").unwrap(),
            ScenarioAssumptions::base_case()
        );
    }

    #[test]
    fn test_duplicate_and_unknown_base_rejected() {
        let mut store = ScenarioStore::new();
        assert!(store
            .create_scenario(OPTIMISTIC, "", BASE_CASE, &AssumptionOverrides::default())
            .is_err());
        assert!(store
            .create_scenario("New", "", "Missing", &AssumptionOverrides::default())
            .is_err());
    }

    #[test]
    fn test_apply_overrides_and_reset() {
        let mut store = ScenarioStore::new();
        let overrides = AssumptionOverrides {
            seasonal_adjustment: Some(dec!(4)),
            ..Default::default()
        };
        let updated = store.apply_overrides(CONSERVATIVE, &overrides).unwrap();
        assert_eq!(updated.assumptions.seasonal_adjustment, dec!(4));
        assert_eq!(updated.assumptions.growth_rate, dec!(1));

        let reset = store.reset_assumptions(CONSERVATIVE).unwrap();
        assert_eq!(reset.assumptions, ScenarioAssumptions::base_case());
    }

    #[test]
    fn test_delete_protects_base_case_and_resets_active() {
        let mut store = ScenarioStore::new();
        assert!(store.delete_scenario(BASE_CASE).is_err());

        store.set_active(OPTIMISTIC).unwrap();
        store.delete_scenario(OPTIMISTIC).unwrap();
        assert_eq!(store.active().name, BASE_CASE);
        assert!(store.get(OPTIMISTIC).is_none());
        assert!(store.delete_scenario(OPTIMISTIC).is_err());
    }

    #[test]
    fn test_set_active_unknown_fails() {
        let mut store = ScenarioStore::new();
        assert!(store.set_active("Nope").is_err());
        assert_eq!(store.active().name, BASE_CASE);
    }
}
