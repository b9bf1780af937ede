use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::DetectError;

/// Data that flows through the preprocessing chain
#[derive(Clone)]
pub struct PipelineData {
    /// The current working image (grayscale after the first step)
    pub image: DynamicImage,
}

impl PipelineData {
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }
}

/// Debug output configuration
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Directory receiving intermediate images for the current input
    pub output_dir: PathBuf,
}

/// Per-run context passed explicitly into every stage
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable debug output. The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, DetectError> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(DetectError::DebugDirNotEmpty(output_dir));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Context whose debug output lands in a subdirectory named `label`
    pub fn scoped(&self, label: &str) -> Self {
        Self {
            debug: self.debug.as_ref().map(|d| DebugConfig {
                output_dir: d.output_dir.join(label),
            }),
        }
    }

    pub fn debug_dir(&self) -> Option<&Path> {
        self.debug.as_ref().map(|d| d.output_dir.as_path())
    }

    /// Save an intermediate image when debug mode is on.
    /// Failures are logged and never affect detection.
    pub fn save_debug(&self, name: &str, image: &DynamicImage) {
        let Some(dir) = self.debug_dir() else {
            return;
        };

        let path = dir.join(format!("{}.png", slug(name)));
        let saved = std::fs::create_dir_all(dir)
            .map_err(image::ImageError::IoError)
            .and_then(|_| image.save(&path));

        match saved {
            Ok(()) => debug!(path = %path.display(), "saved debug image"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save debug image"),
        }
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// One image-to-image transform in the preprocessing chain
pub trait PipelineStep: Send + Sync {
    /// Return a new image; the input is never modified in place
    fn process(&self, data: &PipelineData, context: &PipelineContext) -> Result<PipelineData, DetectError>;

    /// Human-readable name (used for logs and debug file names)
    fn name(&self) -> &str;
}

/// Ordered chain of preprocessing steps
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step in order on the input image
    pub fn run(&self, input: &DynamicImage, context: &PipelineContext) -> Result<PipelineData, DetectError> {
        context.save_debug("00_input", input);

        let mut data = PipelineData::from_image(input.clone());
        for (step_idx, step) in self.steps.iter().enumerate() {
            debug!(step = step.name(), "running preprocessing step");
            data = step.process(&data, context)?;
            context.save_debug(&format!("{:02}_{}", step_idx + 1, step.name()), &data.image);
        }

        Ok(data)
    }
}
