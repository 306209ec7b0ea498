pub mod engine;

pub use engine::{
    analyze_variance, reconcile_forecasts, reconcile_perspectives, MaxVarianceMonth,
    ReconcileInput, ReconciliationMethod, ReconciliationOutput, ReconciliationRecord,
    ReconciliationSettings, UnmatchedPeriods, VarianceAnalysis, VarianceTrend,
};
