use crate::pipeline::{PipelineData, PipelineStep, PipelineContext};
use crate::detection::preprocessing;
use crate::error::DetectError;
use image::DynamicImage;

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: &PipelineData, _context: &PipelineContext) -> Result<PipelineData, DetectError> {
        preprocessing::ensure_non_empty(&data.image)?;
        let gray = preprocessing::to_grayscale(&data.image);
        Ok(PipelineData::from_image(DynamicImage::ImageLuma8(gray)))
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Edge-preserving noise smoothing
pub struct BilateralFilterStep {
    pub radius: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl PipelineStep for BilateralFilterStep {
    fn process(&self, data: &PipelineData, _context: &PipelineContext) -> Result<PipelineData, DetectError> {
        let gray = data.image.to_luma8();
        let smoothed = preprocessing::bilateral_filter(&gray, self.radius, self.sigma_color, self.sigma_space);
        Ok(PipelineData::from_image(DynamicImage::ImageLuma8(smoothed)))
    }

    fn name(&self) -> &str {
        "Bilateral Filter"
    }
}

/// Global contrast normalization
pub struct HistogramEqualizationStep;

impl PipelineStep for HistogramEqualizationStep {
    fn process(&self, data: &PipelineData, _context: &PipelineContext) -> Result<PipelineData, DetectError> {
        let gray = data.image.to_luma8();
        let equalized = preprocessing::equalize_histogram(&gray);
        Ok(PipelineData::from_image(DynamicImage::ImageLuma8(equalized)))
    }

    fn name(&self) -> &str {
        "Histogram Equalization"
    }
}
