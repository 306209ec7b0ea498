pub mod accuracy;
pub mod anomalies;
pub mod confidence;
pub mod data_quality;
pub mod report;

pub use accuracy::{forecast_accuracy, AccuracyGrade, AccuracyInput, AccuracyMetrics};
pub use anomalies::{
    detect_anomalies, detect_forecast_anomalies, Anomaly, AnomalyInput, AnomalyType, Severity,
};
pub use confidence::{
    calculate_forecast_confidence, score_scenario_confidence, ConfidenceFactors,
    ConfidenceGrade, ConfidenceInput, ConfidenceScore, ScenarioSeries,
};
pub use data_quality::{assess_data_quality, DataQualityInput, DataQualityReport};
pub use report::{generate_validation_report, ValidationInput, ValidationReport};
