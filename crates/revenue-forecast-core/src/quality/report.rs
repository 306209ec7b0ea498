use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::anomalies::{detect_anomalies, Anomaly, Severity};
use super::confidence::{score_scenario_confidence, ConfidenceScore, ScenarioSeries};
use super::data_quality::{assess_data_quality, DataQualityInput, DataQualityReport};
use crate::series::ProjectRevenue;
use crate::types::{with_metadata, ComputationOutput};
use crate::ForecastResult;

/// Data quality score below which cleanup is recommended.
const QUALITY_THRESHOLD: u32 = 70;
const LOW_CONFIDENCE: Decimal = dec!(60);
const MANY_ANOMALIES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationInput {
    pub data: DataQualityInput,
    /// Source history the scenarios were built from
    #[serde(default)]
    pub history: Vec<ProjectRevenue>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: DateTime<Utc>,
    pub data_quality: DataQualityReport,
    pub confidence_scores: Vec<ConfidenceScore>,
    pub anomalies: Vec<Anomaly>,
    pub recommendations: Vec<String>,
}

/// Data quality, per-scenario confidence and anomalies in one report, with
/// recommendations derived from all three.
pub fn generate_validation_report(
    input: &ValidationInput,
) -> ForecastResult<ComputationOutput<ValidationReport>> {
    let start = Instant::now();

    let quality = assess_data_quality(&input.data)?;
    let confidence_scores: Vec<ConfidenceScore> = input
        .scenarios
        .iter()
        .map(|s| score_scenario_confidence(&input.history, s))
        .collect();
    let anomalies: Vec<Anomaly> = input.scenarios.iter().flat_map(detect_anomalies).collect();

    let recommendations = recommendations(&quality.result, &confidence_scores, &anomalies);

    let report = ValidationReport {
        generated_at: Utc::now(),
        data_quality: quality.result,
        confidence_scores,
        anomalies,
        recommendations,
    };

    log::debug!(
        "validation report: quality {}, {} scenarios, {} anomalies",
        report.data_quality.overall_score,
        report.confidence_scores.len(),
        report.anomalies.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forecast validation: data quality, scenario confidence, anomaly detection",
        &serde_json::json!({
            "records": input.data.records.len(),
            "scenarios": input.scenarios.len(),
        }),
        quality.warnings,
        elapsed,
        report,
    ))
}

fn recommendations(
    quality: &DataQualityReport,
    scores: &[ConfidenceScore],
    anomalies: &[Anomaly],
) -> Vec<String> {
    let mut out = Vec::new();

    if quality.overall_score < QUALITY_THRESHOLD {
        out.push("Improve data quality by addressing missing values and inconsistencies".into());
    }
    if !quality.issues.is_empty() {
        out.push("Resolve critical data issues before using forecasts for decision-making".into());
    }

    let low: Vec<&str> = scores
        .iter()
        .filter(|s| s.overall_score < LOW_CONFIDENCE)
        .map(|s| s.scenario_name.as_str())
        .collect();
    if !low.is_empty() {
        out.push(format!("Review scenarios with low confidence: {}", low.join(", ")));
    }

    if anomalies.iter().any(|a| a.severity == Severity::High) {
        out.push("Investigate high-severity anomalies in forecast data".into());
    }
    if anomalies.len() > MANY_ANOMALIES {
        out.push("Consider data smoothing or outlier removal for more stable forecasts".into());
    }

    if out.is_empty() {
        out.push("Data quality and forecasts look good; proceed with confidence".into());
    }
    out
}
