pub mod builder;

pub use builder::{
    build_historical_series, build_project_series, parse_revenue_cell, HistoricalPoint,
    HistoricalSeries, ProjectRevenue, RevenueRecord, SeriesInput,
};
