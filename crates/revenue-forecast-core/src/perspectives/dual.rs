use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::confidence::{project_confidence, ProjectMetadata};
use crate::error::ForecastError;
use crate::series::ProjectRevenue;
use crate::types::{with_metadata, ComputationOutput, Money, PeriodRevenue, Rate};
use crate::ForecastResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Bias parameters of the Finance and Sales perspectives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveConfig {
    pub finance_conservatism: Rate,
    pub finance_risk_buffer: Rate,
    pub finance_probability_threshold: Rate,
    pub sales_optimism: Rate,
    pub sales_pipeline_confidence: Rate,
    pub sales_acceleration_factor: Rate,
    pub sales_probability_threshold: Rate,
    /// Offerings that earn the maturity bonus in project confidence
    pub mature_offerings: Vec<String>,
}

impl Default for PerspectiveConfig {
    fn default() -> Self {
        Self {
            finance_conservatism: dec!(0.85),
            finance_risk_buffer: dec!(0.10),
            finance_probability_threshold: dec!(0.75),
            sales_optimism: dec!(1.15),
            sales_pipeline_confidence: dec!(0.90),
            sales_acceleration_factor: dec!(1.05),
            sales_probability_threshold: dec!(0.50),
            mature_offerings: vec!["Core Services".into(), "Established Products".into()],
        }
    }
}

impl PerspectiveConfig {
    pub fn validate(&self) -> ForecastResult<()> {
        for (field, value) in [
            ("finance_probability_threshold", self.finance_probability_threshold),
            ("sales_probability_threshold", self.sales_probability_threshold),
        ] {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ForecastError::invalid(
                    field,
                    format!("Threshold must be within [0, 1] (got {value})"),
                ));
            }
        }

        if self.finance_risk_buffer < Decimal::ZERO || self.finance_risk_buffer >= Decimal::ONE {
            return Err(ForecastError::invalid(
                "finance_risk_buffer",
                format!(
                    "Risk buffer must be within [0, 1) (got {})",
                    self.finance_risk_buffer
                ),
            ));
        }

        for (field, value) in [
            ("finance_conservatism", self.finance_conservatism),
            ("sales_optimism", self.sales_optimism),
            ("sales_pipeline_confidence", self.sales_pipeline_confidence),
            ("sales_acceleration_factor", self.sales_acceleration_factor),
        ] {
            if value < Decimal::ZERO {
                return Err(ForecastError::invalid(
                    field,
                    format!("Multiplier cannot be negative (got {value})"),
                ));
            }
        }
        Ok(())
    }

    /// Combined Finance multiplier: conservatism × (1 − buffer).
    pub fn finance_multiplier(&self) -> Rate {
        self.finance_conservatism * (Decimal::ONE - self.finance_risk_buffer)
    }

    /// Combined Sales multiplier: optimism × pipeline confidence × acceleration.
    pub fn sales_multiplier(&self) -> Rate {
        self.sales_optimism * self.sales_pipeline_confidence * self.sales_acceleration_factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Perspective {
    Finance,
    Sales,
}

impl Perspective {
    pub fn confidence_level(self) -> &'static str {
        match self {
            Perspective::Finance => "High",
            Perspective::Sales => "Medium-High",
        }
    }

    pub fn risk_adjustment(self) -> &'static str {
        match self {
            Perspective::Finance => "Conservative",
            Perspective::Sales => "Optimistic",
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perspective::Finance => f.write_str("Finance"),
            Perspective::Sales => f.write_str("Sales"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveRow {
    pub project_id: String,
    pub period_label: String,
    pub revenue: Money,
}

/// One biased view of the base rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveForecast {
    pub perspective: Perspective,
    pub confidence_level: String,
    pub risk_adjustment: String,
    pub multiplier: Rate,
    pub probability_threshold: Rate,
    pub rows: Vec<PerspectiveRow>,
    pub included_projects: Vec<String>,
    pub total_revenue: Money,
}

impl PerspectiveForecast {
    /// Revenue summed per period label, ordered by label.
    pub fn period_revenue(&self) -> Vec<PeriodRevenue> {
        let mut buckets: BTreeMap<&str, Money> = BTreeMap::new();
        for row in &self.rows {
            *buckets.entry(row.period_label.as_str()).or_insert(Decimal::ZERO) += row.revenue;
        }
        buckets
            .into_iter()
            .map(|(label, revenue)| PeriodRevenue {
                period_label: label.to_string(),
                revenue,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfidence {
    pub project_id: String,
    pub confidence: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerspectiveInput {
    /// Per-project, per-period base revenue
    pub base: Vec<ProjectRevenue>,
    pub projects: Vec<ProjectMetadata>,
    #[serde(default)]
    pub config: PerspectiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualPerspective {
    pub finance: PerspectiveForecast,
    pub sales: PerspectiveForecast,
    pub project_confidence: Vec<ProjectConfidence>,
    /// Base rows whose project has no metadata
    pub unknown_project_rows: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Finance and Sales forecasts derived from the same base rows.
pub fn generate_perspectives(
    input: &PerspectiveInput,
) -> ForecastResult<ComputationOutput<DualPerspective>> {
    let start = Instant::now();
    let config = &input.config;
    config.validate()?;

    let mut warnings: Vec<String> = Vec::new();

    // Last metadata row per project wins
    let mut confidences: BTreeMap<&str, Rate> = BTreeMap::new();
    let mut duplicates: BTreeSet<&str> = BTreeSet::new();
    for meta in &input.projects {
        let confidence = project_confidence(meta, config.mature_offerings.as_slice());
        if confidences.insert(meta.project_id.as_str(), confidence).is_some() {
            duplicates.insert(meta.project_id.as_str());
        }
    }
    if !duplicates.is_empty() {
        warnings.push(format!(
            "Duplicate project metadata; the last row was used for: {}",
            duplicates.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    let unknown_project_rows = input
        .base
        .iter()
        .filter(|r| !confidences.contains_key(r.project_id.as_str()))
        .count();
    if unknown_project_rows > 0 {
        warnings.push(format!(
            "{unknown_project_rows} base row(s) reference projects without metadata and were excluded"
        ));
        log::warn!("perspectives: {unknown_project_rows} rows without project metadata");
    }
    if input.base.is_empty() {
        warnings.push("No base revenue rows; both perspectives are empty".into());
    }

    let finance = build_perspective(
        Perspective::Finance,
        &input.base,
        &confidences,
        config.finance_multiplier(),
        config.finance_probability_threshold,
    );
    let sales = build_perspective(
        Perspective::Sales,
        &input.base,
        &confidences,
        config.sales_multiplier(),
        config.sales_probability_threshold,
    );

    log::debug!(
        "perspectives: finance {} rows, sales {} rows",
        finance.rows.len(),
        sales.rows.len()
    );

    let result = DualPerspective {
        finance,
        sales,
        project_confidence: confidences
            .iter()
            .map(|(id, c)| ProjectConfidence {
                project_id: id.to_string(),
                confidence: *c,
            })
            .collect(),
        unknown_project_rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Dual perspective: confidence-filtered, bias-adjusted Finance and Sales views",
        config,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn build_perspective(
    perspective: Perspective,
    base: &[ProjectRevenue],
    confidences: &BTreeMap<&str, Rate>,
    multiplier: Rate,
    threshold: Rate,
) -> PerspectiveForecast {
    let included: BTreeSet<&str> = confidences
        .iter()
        .filter(|(_, c)| **c >= threshold)
        .map(|(id, _)| *id)
        .collect();

    let rows: Vec<PerspectiveRow> = base
        .iter()
        .filter(|r| included.contains(r.project_id.as_str()))
        .map(|r| PerspectiveRow {
            project_id: r.project_id.clone(),
            period_label: r.period_label.clone(),
            revenue: r.revenue * multiplier,
        })
        .collect();

    let total_revenue = rows.iter().map(|r| r.revenue).sum();

    PerspectiveForecast {
        perspective,
        confidence_level: perspective.confidence_level().to_string(),
        risk_adjustment: perspective.risk_adjustment().to_string(),
        multiplier,
        probability_threshold: threshold,
        rows,
        included_projects: included.into_iter().map(str::to_string).collect(),
        total_revenue,
    }
}
