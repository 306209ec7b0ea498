use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::projection::ForecastPoint;
use crate::series::ProjectRevenue;
use crate::stats::{clamp_score, mean, population_std_dev, safe_div};
use crate::types::{with_metadata, ComputationOutput, PeriodRevenue, Rate, Score};
use crate::ForecastResult;

const COVERAGE_WEIGHT: Decimal = dec!(0.25);
const CONSISTENCY_WEIGHT: Decimal = dec!(0.25);
const TEMPORAL_WEIGHT: Decimal = dec!(0.20);
const DIVERSITY_WEIGHT: Decimal = dec!(0.15);
const REASONABLENESS_WEIGHT: Decimal = dec!(0.15);

/// Neutral consistency score when fewer than two non-zero values exist.
const NEUTRAL_CONSISTENCY: Decimal = dec!(50);
/// Temporal score for a single-period scenario.
const SINGLE_PERIOD_TEMPORAL: Decimal = dec!(30);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A produced scenario reduced to per-period totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSeries {
    pub scenario_name: String,
    /// Overall adjustment the scenario applies relative to base (1.0 = none)
    #[serde(default = "default_multiplier")]
    pub multiplier: Rate,
    pub periods: Vec<PeriodRevenue>,
}

fn default_multiplier() -> Rate {
    Decimal::ONE
}

impl ScenarioSeries {
    /// Collapse forecast points into per-label totals, ordered by label.
    pub fn from_forecast(scenario_name: &str, multiplier: Rate, points: &[ForecastPoint]) -> Self {
        let mut periods: Vec<PeriodRevenue> = Vec::new();
        let mut sorted: Vec<&ForecastPoint> = points.iter().collect();
        sorted.sort_by(|a, b| a.period_label.cmp(&b.period_label));
        for p in sorted {
            match periods.last_mut() {
                Some(last) if last.period_label == p.period_label => last.revenue += p.revenue,
                _ => periods.push(PeriodRevenue {
                    period_label: p.period_label.clone(),
                    revenue: p.revenue,
                }),
            }
        }
        Self {
            scenario_name: scenario_name.to_string(),
            multiplier,
            periods,
        }
    }

    pub fn total(&self) -> Decimal {
        self.periods.iter().map(|p| p.revenue).sum()
    }
}

/// Letter grade; variants are ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceGrade {
    F,
    D,
    C,
    B,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl ConfidenceGrade {
    pub fn from_score(score: Decimal) -> Self {
        if score >= dec!(90) {
            ConfidenceGrade::APlus
        } else if score >= dec!(80) {
            ConfidenceGrade::A
        } else if score >= dec!(70) {
            ConfidenceGrade::B
        } else if score >= dec!(60) {
            ConfidenceGrade::C
        } else if score >= dec!(50) {
            ConfidenceGrade::D
        } else {
            ConfidenceGrade::F
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceGrade::APlus => "A+ (Excellent)",
            ConfidenceGrade::A => "A (Very High)",
            ConfidenceGrade::B => "B (High)",
            ConfidenceGrade::C => "C (Moderate)",
            ConfidenceGrade::D => "D (Low)",
            ConfidenceGrade::F => "F (Very Low)",
        }
    }
}

impl fmt::Display for ConfidenceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceGrade::APlus => "A+",
            ConfidenceGrade::A => "A",
            ConfidenceGrade::B => "B",
            ConfidenceGrade::C => "C",
            ConfidenceGrade::D => "D",
            ConfidenceGrade::F => "F",
        };
        f.write_str(s)
    }
}

/// The five sub-scores, each in [0, 100].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub data_coverage: Score,
    pub data_consistency: Score,
    pub temporal_distribution: Score,
    pub project_diversity: Score,
    pub scenario_reasonableness: Score,
}

impl ConfidenceFactors {
    pub fn weighted_total(&self) -> Score {
        self.data_coverage * COVERAGE_WEIGHT
            + self.data_consistency * CONSISTENCY_WEIGHT
            + self.temporal_distribution * TEMPORAL_WEIGHT
            + self.project_diversity * DIVERSITY_WEIGHT
            + self.scenario_reasonableness * REASONABLENESS_WEIGHT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub scenario_name: String,
    /// Weighted total rounded to one decimal place
    pub overall_score: Score,
    pub factor_breakdown: ConfidenceFactors,
    pub grade: ConfidenceGrade,
    pub grade_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInput {
    /// Source history the scenarios were built from
    pub history: Vec<ProjectRevenue>,
    pub scenarios: Vec<ScenarioSeries>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// 0–100 confidence for one produced scenario.
pub fn score_scenario_confidence(history: &[ProjectRevenue], scenario: &ScenarioSeries) -> ConfidenceScore {
    let factors = ConfidenceFactors {
        data_coverage: data_coverage(history, scenario),
        data_consistency: data_consistency(history),
        temporal_distribution: temporal_distribution(scenario),
        project_diversity: project_diversity(history),
        scenario_reasonableness: scenario_reasonableness(scenario.multiplier),
    };

    let overall = clamp_score(factors.weighted_total());
    // Grade from the unrounded total
    let grade = ConfidenceGrade::from_score(overall);

    ConfidenceScore {
        scenario_name: scenario.scenario_name.clone(),
        overall_score: overall.round_dp(1),
        factor_breakdown: factors,
        grade,
        grade_label: grade.label().to_string(),
    }
}

/// Confidence scores for every scenario of the input, in input order.
pub fn calculate_forecast_confidence(
    input: &ConfidenceInput,
) -> ForecastResult<ComputationOutput<Vec<ConfidenceScore>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.history.is_empty() {
        warnings.push("No source history; coverage and diversity scores are degenerate".into());
    }
    if input.scenarios.is_empty() {
        warnings.push("No scenarios to score".into());
    }

    let scores: Vec<ConfidenceScore> = input
        .scenarios
        .iter()
        .map(|s| score_scenario_confidence(&input.history, s))
        .collect();

    for s in &scores {
        log::debug!("confidence '{}': {} ({})", s.scenario_name, s.overall_score, s.grade);
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted confidence: coverage 25%, consistency 25%, temporal 20%, diversity 15%, reasonableness 15%",
        &serde_json::json!({
            "history_records": input.history.len(),
            "scenarios": input.scenarios.len(),
        }),
        warnings,
        elapsed,
        scores,
    ))
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

fn data_coverage(history: &[ProjectRevenue], scenario: &ScenarioSeries) -> Score {
    let distinct: BTreeSet<&str> = history.iter().map(|r| r.period_label.as_str()).collect();
    let denominator = Decimal::from(distinct.len().max(1) as u64);
    let periods = Decimal::from(scenario.periods.len() as u64);
    clamp_score(periods / denominator * dec!(100))
}

fn data_consistency(history: &[ProjectRevenue]) -> Score {
    let non_zero: Vec<Decimal> = history
        .iter()
        .map(|r| r.revenue)
        .filter(|v| *v > Decimal::ZERO)
        .collect();
    if non_zero.len() < 2 {
        return NEUTRAL_CONSISTENCY;
    }
    let cv = safe_div(population_std_dev(&non_zero), mean(&non_zero));
    clamp_score(dec!(100) - cv * dec!(50))
}

fn temporal_distribution(scenario: &ScenarioSeries) -> Score {
    if scenario.periods.len() < 2 {
        return SINGLE_PERIOD_TEMPORAL;
    }
    let total = scenario.total();
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let max_period = scenario
        .periods
        .iter()
        .map(|p| p.revenue)
        .max()
        .unwrap_or(Decimal::ZERO);
    clamp_score(dec!(100) - max_period / total * dec!(100))
}

fn project_diversity(history: &[ProjectRevenue]) -> Score {
    if history.is_empty() {
        return Decimal::ZERO;
    }
    let unique: BTreeSet<&str> = history.iter().map(|r| r.project_id.as_str()).collect();
    let ratio = Decimal::from(unique.len() as u64) / Decimal::from(history.len() as u64);
    clamp_score(ratio * dec!(200))
}

fn scenario_reasonableness(multiplier: Rate) -> Score {
    let distance = (Decimal::ONE - multiplier).abs();
    if multiplier >= dec!(0.5) && multiplier <= dec!(2.0) {
        clamp_score(dec!(100) - distance * dec!(50))
    } else {
        clamp_score(dec!(50) - distance * dec!(25))
    }
}
