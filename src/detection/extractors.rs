//! Band extractors: three differently-processed views of one image, each
//! feeding its own candidate search.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::debug;

use crate::config::{ColorRange, GradientConfig, OpeningConfig};
use crate::detection::preprocessing;
use crate::error::DetectError;

/// Gradient-magnitude maps computed from the thinned image
#[derive(Debug, Clone)]
pub struct GradientBands {
    /// d/dx response: strong on vertical strokes
    pub vertical: GrayImage,
    /// d/dy response: strong on horizontal strokes
    pub horizontal: GrayImage,
}

/// Binarize, skeletonize, then take normalized first derivatives along each axis
pub fn gradient_bands(preprocessed: &GrayImage, config: &GradientConfig) -> GradientBands {
    let binary = preprocessing::binary_threshold(preprocessed, config.binarize_threshold);
    let skeleton = preprocessing::skeletonize(&binary);

    debug!(
        skeleton_pixels = skeleton.pixels().filter(|p| p[0] > 0).count(),
        "skeletonized"
    );

    GradientBands {
        vertical: preprocessing::normalize_gradient(&horizontal_sobel(&skeleton)),
        horizontal: preprocessing::normalize_gradient(&vertical_sobel(&skeleton)),
    }
}

/// Image minus its rectangular opening: keeps bright structures thinner than the kernel
pub fn morphological_bands(preprocessed: &GrayImage, config: &OpeningConfig) -> GrayImage {
    let mask = preprocessing::rect_mask(config.kernel_width, config.kernel_height);
    let opened = preprocessing::open(preprocessed, &mask, config.iterations);
    preprocessing::subtract(preprocessed, &opened)
}

/// One binary mask per configured color range, in configuration order.
///
/// Operates on the original color image; single-channel input is rejected.
pub fn color_bands(original: &DynamicImage, ranges: &[ColorRange]) -> Result<Vec<GrayImage>, DetectError> {
    preprocessing::ensure_non_empty(original)?;
    if !original.color().has_color() {
        return Err(DetectError::MalformedImage {
            width: original.width(),
            height: original.height(),
            reason: "color extraction needs a three-channel image",
        });
    }

    let rgb = original.to_rgb8();
    let hsv: Vec<[u8; 3]> = rgb.pixels().map(|p| preprocessing::rgb_to_hsv(p.0)).collect();
    let width = rgb.width();

    let masks = ranges
        .iter()
        .map(|range| {
            ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
                if range.contains(hsv[(y * width + x) as usize]) {
                    Luma([255u8])
                } else {
                    Luma([0u8])
                }
            })
        })
        .collect();

    Ok(masks)
}
