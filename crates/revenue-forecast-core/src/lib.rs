pub mod calendar;
pub mod error;
pub mod projection;
pub mod series;
pub mod stats;
pub mod types;

#[cfg(feature = "risk")]
pub mod risk;

#[cfg(feature = "perspectives")]
pub mod perspectives;

#[cfg(feature = "reconciliation")]
pub mod reconciliation;

#[cfg(feature = "quality")]
pub mod quality;

#[cfg(all(feature = "risk", feature = "reconciliation"))]
pub mod config;

pub use error::ForecastError;
pub use types::*;

/// Standard result type for all forecasting operations
pub type ForecastResult<T> = Result<T, ForecastError>;
