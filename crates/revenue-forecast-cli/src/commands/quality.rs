use clap::Args;
use serde_json::Value;

use revenue_forecast_core::quality::{
    self, AccuracyInput, AnomalyInput, ConfidenceInput, DataQualityInput, ValidationInput,
};

use crate::input;

/// Arguments for scenario confidence scoring
#[derive(Args)]
pub struct ConfidenceArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for anomaly detection
#[derive(Args)]
pub struct AnomaliesArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for data quality assessment
#[derive(Args)]
pub struct DataQualityArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the full validation report
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for forecast accuracy
#[derive(Args)]
pub struct AccuracyArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_confidence(args: ConfidenceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let c_input: ConfidenceInput = input::read_input(args.input.as_deref(), "confidence scoring")?;
    let result = quality::calculate_forecast_confidence(&c_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_anomalies(args: AnomaliesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let a_input: AnomalyInput = input::read_input(args.input.as_deref(), "anomaly detection")?;
    let result = quality::detect_forecast_anomalies(&a_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_data_quality(args: DataQualityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let dq_input: DataQualityInput = input::read_input(args.input.as_deref(), "data quality")?;
    let result = quality::assess_data_quality(&dq_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let v_input: ValidationInput = input::read_input(args.input.as_deref(), "validation")?;
    let result = quality::generate_validation_report(&v_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_accuracy(args: AccuracyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let acc_input: AccuracyInput = input::read_input(args.input.as_deref(), "accuracy")?;
    let result = quality::forecast_accuracy(&acc_input)?;
    Ok(serde_json::to_value(result)?)
}
