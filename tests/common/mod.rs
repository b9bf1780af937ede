mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from platelocate for tests
pub use platelocate::{
    BoundingBox, CandidateOutcome, DetectError, DetectorConfig, ImageSize, MethodInput,
    PipelineContext, PlateLocator,
};
