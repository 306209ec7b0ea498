pub mod confidence;
pub mod dual;

pub use confidence::{project_confidence, ProjectMetadata};
pub use dual::{
    generate_perspectives, DualPerspective, Perspective, PerspectiveConfig, PerspectiveForecast,
    PerspectiveInput, PerspectiveRow, ProjectConfidence,
};
