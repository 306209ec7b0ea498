use std::fmt;
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::confidence::ScenarioSeries;
use crate::calendar::sort_by_period;
use crate::stats::{mean, population_std_dev};
use crate::types::{with_metadata, ComputationOutput};
use crate::ForecastResult;

const SPIKE_SIGMAS: Decimal = dec!(3);
const HIGH_SPIKE_SIGMAS: Decimal = dec!(4);
/// Growth magnitudes as fractions (2.0 = 200%).
const EXTREME_GROWTH: Decimal = dec!(2.0);
const HIGH_EXTREME_GROWTH: Decimal = dec!(5.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    RevenueSpike,
    ZeroRevenue,
    ExtremeGrowth,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnomalyType::RevenueSpike => "revenue_spike",
            AnomalyType::ZeroRevenue => "zero_revenue",
            AnomalyType::ExtremeGrowth => "extreme_growth",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_type: AnomalyType,
    pub scenario_name: String,
    pub period_label: String,
    /// Revenue for spikes and zeros; growth in percent for extreme growth
    pub value: Decimal,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyInput {
    pub scenarios: Vec<ScenarioSeries>,
}

/// Run the spike, zero and growth checks over one scenario. The checks are
/// independent, so one period can be reported more than once.
pub fn detect_anomalies(scenario: &ScenarioSeries) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let name = scenario.scenario_name.as_str();
    let anomaly = |anomaly_type, period_label: &str, value, severity| Anomaly {
        anomaly_type,
        scenario_name: name.to_string(),
        period_label: period_label.to_string(),
        value,
        severity,
    };

    // Spikes
    if scenario.periods.len() >= 2 {
        let values: Vec<Decimal> = scenario.periods.iter().map(|p| p.revenue).collect();
        let m = mean(&values);
        let sd = population_std_dev(&values);
        for p in &scenario.periods {
            let deviation = (p.revenue - m).abs();
            if deviation > SPIKE_SIGMAS * sd {
                let severity = if deviation > HIGH_SPIKE_SIGMAS * sd {
                    Severity::High
                } else {
                    Severity::Medium
                };
                anomalies.push(anomaly(AnomalyType::RevenueSpike, &p.period_label, p.revenue, severity));
            }
        }
    }

    // Zeros
    for p in scenario.periods.iter().filter(|p| p.revenue.is_zero()) {
        anomalies.push(anomaly(
            AnomalyType::ZeroRevenue,
            &p.period_label,
            Decimal::ZERO,
            Severity::Medium,
        ));
    }

    // Growth, in period order
    let mut sorted: Vec<_> = scenario.periods.iter().collect();
    sort_by_period(&mut sorted, |p| p.period_label.as_str());
    for pair in sorted.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev.revenue <= Decimal::ZERO {
            continue;
        }
        let growth = (curr.revenue - prev.revenue) / prev.revenue;
        if growth.abs() > EXTREME_GROWTH {
            let severity = if growth.abs() > HIGH_EXTREME_GROWTH {
                Severity::High
            } else {
                Severity::Medium
            };
            anomalies.push(anomaly(
                AnomalyType::ExtremeGrowth,
                &curr.period_label,
                growth * dec!(100),
                severity,
            ));
        }
    }

    anomalies
}

/// Anomalies across every scenario, in scenario order.
pub fn detect_forecast_anomalies(
    input: &AnomalyInput,
) -> ForecastResult<ComputationOutput<Vec<Anomaly>>> {
    let start = Instant::now();
    let anomalies: Vec<Anomaly> = input.scenarios.iter().flat_map(detect_anomalies).collect();

    let high = anomalies.iter().filter(|a| a.severity == Severity::High).count();
    if high > 0 {
        log::warn!("anomalies: {high} high-severity findings");
    }
    log::debug!(
        "anomalies: {} findings over {} scenarios",
        anomalies.len(),
        input.scenarios.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Anomaly detection: 3-sigma spikes, zero periods, >200% period-over-period growth",
        &serde_json::json!({
            "spike_sigmas": SPIKE_SIGMAS,
            "extreme_growth_pct": EXTREME_GROWTH * dec!(100),
        }),
        Vec::new(),
        elapsed,
        anomalies,
    ))
}
