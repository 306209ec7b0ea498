use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::stats::{checked_mean, safe_pct, sqrt_decimal};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::ForecastResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyInput {
    pub actual: Vec<Money>,
    pub predicted: Vec<Money>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccuracyGrade {
    D,
    C,
    B,
    A,
    #[serde(rename = "A+")]
    APlus,
}

impl AccuracyGrade {
    pub fn from_mape(mape: Percent) -> Self {
        if mape <= dec!(10) {
            AccuracyGrade::APlus
        } else if mape <= dec!(20) {
            AccuracyGrade::A
        } else if mape <= dec!(30) {
            AccuracyGrade::B
        } else if mape <= dec!(50) {
            AccuracyGrade::C
        } else {
            AccuracyGrade::D
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccuracyGrade::APlus => "A+ (Excellent)",
            AccuracyGrade::A => "A (Very Good)",
            AccuracyGrade::B => "B (Good)",
            AccuracyGrade::C => "C (Fair)",
            AccuracyGrade::D => "D (Poor)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: Money,
    pub mse: Decimal,
    pub rmse: Money,
    /// Over periods with a non-zero actual
    pub mape: Percent,
    /// Mean of predicted − actual
    pub bias: Money,
    pub bias_pct: Percent,
    /// Share of steps where predicted and actual moved the same way
    pub directional_accuracy: Percent,
    pub accuracy_grade: AccuracyGrade,
    pub grade_label: String,
    pub observations: usize,
}

impl AccuracyMetrics {
    fn zeroed() -> Self {
        Self {
            mae: Decimal::ZERO,
            mse: Decimal::ZERO,
            rmse: Decimal::ZERO,
            mape: Decimal::ZERO,
            bias: Decimal::ZERO,
            bias_pct: Decimal::ZERO,
            directional_accuracy: Decimal::ZERO,
            accuracy_grade: AccuracyGrade::APlus,
            grade_label: AccuracyGrade::APlus.label().to_string(),
            observations: 0,
        }
    }
}

/// Error metrics of a forecast against realized actuals.
pub fn forecast_accuracy(input: &AccuracyInput) -> ForecastResult<ComputationOutput<AccuracyMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.actual.len() != input.predicted.len() {
        return Err(ForecastError::invalid(
            "predicted",
            format!(
                "actual has {} values but predicted has {}",
                input.actual.len(),
                input.predicted.len()
            ),
        ));
    }

    let metrics = if input.actual.is_empty() {
        warnings.push("No observations; accuracy metrics are zeroed".into());
        AccuracyMetrics::zeroed()
    } else {
        compute(&input.actual, &input.predicted, &mut warnings)?
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forecast accuracy: MAE, MSE, RMSE, MAPE, bias, directional accuracy",
        &serde_json::json!({ "observations": input.actual.len() }),
        warnings,
        elapsed,
        metrics,
    ))
}

fn compute(
    actual: &[Money],
    predicted: &[Money],
    warnings: &mut Vec<String>,
) -> ForecastResult<AccuracyMetrics> {
    let overflow = |what: &str| {
        ForecastError::invalid(
            "predicted",
            format!("{what} overflows decimal range; rescale the series"),
        )
    };

    let errors: Vec<Decimal> = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| p.checked_sub(*a))
        .collect::<Option<_>>()
        .ok_or_else(|| overflow("forecast error"))?;
    let abs_errors: Vec<Decimal> = errors.iter().map(|e| e.abs()).collect();
    let squared: Vec<Decimal> = errors
        .iter()
        .map(|e| e.checked_mul(*e))
        .collect::<Option<_>>()
        .ok_or_else(|| overflow("squared error"))?;

    let pct_errors: Vec<Percent> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| !a.is_zero())
        .map(|(a, p)| {
            a.checked_sub(*p)
                .and_then(|d| d.checked_div(*a))
                .and_then(|r| r.abs().checked_mul(dec!(100)))
        })
        .collect::<Option<_>>()
        .ok_or_else(|| overflow("percentage error"))?;
    if pct_errors.len() < actual.len() {
        warnings.push(format!(
            "{} period(s) with zero actuals excluded from MAPE",
            actual.len() - pct_errors.len()
        ));
    }

    let directional_accuracy = if actual.len() > 1 {
        let steps = actual.len() - 1;
        let agree = actual
            .windows(2)
            .zip(predicted.windows(2))
            .filter(|(a, p)| (a[1] > a[0]) == (p[1] > p[0]))
            .count();
        safe_pct(Decimal::from(agree as u64), Decimal::from(steps as u64))
    } else {
        Decimal::ZERO
    };

    let mse = checked_mean(&squared).ok_or_else(|| overflow("mean squared error"))?;
    let mape = checked_mean(&pct_errors).ok_or_else(|| overflow("mean percentage error"))?;
    let bias = checked_mean(&errors).ok_or_else(|| overflow("bias"))?;
    let mae = checked_mean(&abs_errors).ok_or_else(|| overflow("mean absolute error"))?;
    let mean_actual = checked_mean(actual).ok_or_else(|| overflow("mean actual"))?;
    let bias_pct = if mean_actual.is_zero() {
        Decimal::ZERO
    } else {
        bias.checked_div(mean_actual)
            .and_then(|r| r.checked_mul(dec!(100)))
            .ok_or_else(|| overflow("bias percentage"))?
    };
    let grade = AccuracyGrade::from_mape(mape);

    Ok(AccuracyMetrics {
        mae,
        mse,
        rmse: sqrt_decimal(mse),
        mape,
        bias,
        bias_pct,
        directional_accuracy,
        accuracy_grade: grade,
        grade_label: grade.label().to_string(),
        observations: actual.len(),
    })
}
