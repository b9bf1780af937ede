pub mod batch;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;

pub use config::DetectorConfig;
pub use detection::{Localization, PlateLocator, VehicleDetector, VehicleLocalization, WholeImage};
pub use detection::candidates::{find_candidates, CandidateOutcome, MethodInput};
pub use error::{ConfigError, DetectError};
pub use models::{BoundingBox, CandidateSet, ImageSize, MethodTag, Region};
pub use pipeline::{Pipeline, PipelineContext, PipelineData, PipelineStep};
