pub mod forecast;
pub mod perspectives;
pub mod quality;
pub mod reconcile;
pub mod risk;
pub mod series;
