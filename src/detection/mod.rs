pub mod preprocessing;
pub mod extractors;
pub mod contours;
pub mod candidates;
pub mod heuristics;
pub mod steps;

use image::{DynamicImage, GrayImage};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{DetectorConfig, FinderParams};
use crate::detection::candidates::{find_candidates, MethodInput};
use crate::detection::steps::*;
use crate::error::DetectError;
use crate::models::{BoundingBox, CandidateSet, ImageSize};
use crate::pipeline::{Pipeline, PipelineContext};

/// Per-method candidates plus the boxes surviving the heuristic filter
#[derive(Debug, Clone, PartialEq)]
pub struct Localization {
    pub candidates: CandidateSet,
    pub filtered: Vec<BoundingBox>,
}

/// Localization of one vehicle crop, in crop-local coordinates
#[derive(Debug, Clone)]
pub struct VehicleLocalization {
    /// Crop region in the full photograph
    pub region: BoundingBox,
    pub localization: Localization,
}

/// Upstream detector splitting a photograph into vehicle crops
pub trait VehicleDetector {
    fn detect_vehicles(&self, image: &DynamicImage) -> Vec<BoundingBox>;
}

/// Treats the whole photograph as one vehicle
pub struct WholeImage;

impl VehicleDetector for WholeImage {
    fn detect_vehicles(&self, image: &DynamicImage) -> Vec<BoundingBox> {
        BoundingBox::full(ImageSize::of(image)).into_iter().collect()
    }
}

/// Multi-method plate localization orchestrator
pub struct PlateLocator {
    config: DetectorConfig,
    preprocessing: Pipeline,
}

impl PlateLocator {
    /// Validate the configuration and build the preprocessing chain
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate()?;

        let preprocessing = Pipeline::new()
            .add_step(Arc::new(GrayscaleStep))
            .add_step(Arc::new(BilateralFilterStep {
                radius: config.preprocess.bilateral_radius,
                sigma_color: config.preprocess.sigma_color,
                sigma_space: config.preprocess.sigma_space,
            }))
            .add_step(Arc::new(HistogramEqualizationStep));

        Ok(Self { config, preprocessing })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Grayscale, smooth, equalize
    pub fn preprocess(&self, image: &DynamicImage, context: &PipelineContext) -> Result<GrayImage, DetectError> {
        preprocessing::ensure_non_empty(image)?;
        Ok(self.preprocessing.run(image, context)?.image.to_luma8())
    }

    /// Run all three extractors and candidate searches on one image
    pub fn find_all(&self, image: &DynamicImage, context: &PipelineContext) -> Result<CandidateSet, DetectError> {
        let working = self.preprocess(image, context)?;
        let finder = &self.config.finder;

        let bands = extractors::gradient_bands(&working, &self.config.gradient);
        context.save_debug("10_gradient_vertical", &DynamicImage::ImageLuma8(bands.vertical.clone()));
        context.save_debug("11_gradient_horizontal", &DynamicImage::ImageLuma8(bands.horizontal.clone()));
        // A method finding nothing contributes an empty list; the image carries on
        let gradient = find_candidates(
            MethodInput::Gradient {
                vertical: &bands.vertical,
                horizontal: &bands.horizontal,
                min_coincidence: self.config.gradient.min_coincidence,
            },
            &finder.gradient,
        )?
        .into_boxes();

        let opening = extractors::morphological_bands(&working, &self.config.opening);
        context.save_debug("12_opening_residual", &DynamicImage::ImageLuma8(opening.clone()));
        let morphological = find_candidates(MethodInput::Morphological(&opening), &finder.morphological)?.into_boxes();

        let masks = extractors::color_bands(image, &self.config.color.ranges)?;
        let color = self.color_candidates(&masks, &finder.color, context)?;

        let set = CandidateSet::new(gradient, morphological, color);
        debug!(
            gradient = set.gradient().len(),
            morphological = set.morphological().len(),
            color = set.color().len(),
            "aggregated candidates"
        );
        Ok(set)
    }

    fn color_candidates(
        &self,
        masks: &[GrayImage],
        params: &FinderParams,
        context: &PipelineContext,
    ) -> Result<Vec<BoundingBox>, DetectError> {
        let mut boxes = Vec::new();
        for (mask, range) in masks.iter().zip(&self.config.color.ranges) {
            context.save_debug(&format!("13_color_{}", range.name), &DynamicImage::ImageLuma8(mask.clone()));
            boxes.extend(find_candidates(MethodInput::Color(mask), params)?.into_boxes());
        }
        Ok(boxes)
    }

    /// Candidates from every method, then the heuristic filter
    pub fn locate(&self, image: &DynamicImage, context: &PipelineContext) -> Result<Localization, DetectError> {
        let candidates = self.find_all(image, context)?;
        let size = ImageSize::of(image);
        let filtered = heuristics::filter(&candidates.all(), size, &self.config.heuristics);

        info!(
            width = size.width,
            height = size.height,
            candidates = candidates.len(),
            filtered = filtered.len(),
            "localized plates"
        );

        Ok(Localization { candidates, filtered })
    }

    /// Run [`PlateLocator::locate`] once per vehicle crop
    pub fn locate_vehicles(
        &self,
        image: &DynamicImage,
        detector: &dyn VehicleDetector,
        context: &PipelineContext,
    ) -> Result<Vec<VehicleLocalization>, DetectError> {
        preprocessing::ensure_non_empty(image)?;
        let size = ImageSize::of(image);

        let mut results = Vec::new();
        for (idx, region) in detector.detect_vehicles(image).into_iter().enumerate() {
            if !region.fits_within(size) {
                warn!(region = %region, "vehicle region exceeds image bounds, skipping");
                continue;
            }

            let crop = image.crop_imm(region.x0, region.y0, region.width(), region.height());
            let localization = self.locate(&crop, &context.scoped(&format!("vehicle_{:02}", idx)))?;
            results.push(VehicleLocalization { region, localization });
        }

        Ok(results)
    }
}
