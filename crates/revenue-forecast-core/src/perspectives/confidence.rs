use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;

/// Project attributes feeding the per-project confidence heuristic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub offering: String,
}

/// Heuristic confidence that a project's revenue materializes, in [0, 1].
///
/// Starts at 0.7: Active status adds 0.2, Pipeline subtracts 0.1, a client
/// name containing "existing" adds 0.15, and a mature offering adds 0.10.
pub fn project_confidence<S: AsRef<str>>(meta: &ProjectMetadata, mature_offerings: &[S]) -> Rate {
    let mut score = dec!(0.7);

    match meta.status.as_str() {
        "Active" => score += dec!(0.2),
        "Pipeline" => score -= dec!(0.1),
        _ => {}
    }

    if meta.client.to_lowercase().contains("existing") {
        score += dec!(0.15);
    }

    if mature_offerings
        .iter()
        .any(|o| o.as_ref() == meta.offering)
    {
        score += dec!(0.10);
    }

    score.max(Decimal::ZERO).min(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATURE: &[&str] = &["Core Services", "Established Products"];

    fn meta(status: &str, client: &str, offering: &str) -> ProjectMetadata {
        ProjectMetadata {
            project_id: "P1".into(),
            status: status.into(),
            client: client.into(),
            offering: offering.into(),
        }
    }

    #[test]
    fn test_baseline() {
        assert_eq!(project_confidence(&meta("On Hold", "Acme", "Beta"), MATURE), dec!(0.7));
    }

    #[test]
    fn test_pipeline_penalty() {
        assert_eq!(project_confidence(&meta("Pipeline", "Acme", "Beta"), MATURE), dec!(0.6));
    }

    #[test]
    fn test_clamped_at_one() {
        let m = meta("Active", "Existing Client Co", "Core Services");
        assert_eq!(project_confidence(&m, MATURE), Decimal::ONE);
    }

    #[test]
    fn test_client_match_is_case_insensitive() {
        let m = meta("Pipeline", "EXISTING account", "Beta");
        assert_eq!(project_confidence(&m, MATURE), dec!(0.75));
    }
}
