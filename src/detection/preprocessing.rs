use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::{self, ThresholdType};
use imageproc::filter;
use imageproc::morphology::{grayscale_close, grayscale_dilate, grayscale_erode, Mask};

use crate::error::DetectError;

/// Reject images the pipeline cannot work on
pub fn ensure_non_empty(img: &DynamicImage) -> Result<(), DetectError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(DetectError::MalformedImage {
            width: img.width(),
            height: img.height(),
            reason: "image has no pixels",
        });
    }
    Ok(())
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Edge-preserving smoothing over a `2 * radius + 1` window.
/// A single-intensity image is returned unchanged.
pub fn bilateral_filter(img: &GrayImage, radius: u32, sigma_color: f32, sigma_space: f32) -> GrayImage {
    if is_uniform(img) {
        return img.clone();
    }
    filter::bilateral_filter(img, 2 * radius + 1, sigma_color, sigma_space)
}

/// Global histogram equalization. A single-intensity image has no
/// contrast to stretch and is returned unchanged.
pub fn equalize_histogram(img: &GrayImage) -> GrayImage {
    if is_uniform(img) {
        return img.clone();
    }
    contrast::equalize_histogram(img)
}

/// Pixels strictly above `thresh` become 255, the rest 0
pub fn binary_threshold(img: &GrayImage, thresh: u8) -> GrayImage {
    contrast::threshold(img, thresh, ThresholdType::Binary)
}

pub fn is_uniform(img: &GrayImage) -> bool {
    let mut pixels = img.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|p| p == first),
        None => true,
    }
}

pub fn has_foreground(img: &GrayImage) -> bool {
    img.pixels().any(|p| p[0] > 0)
}

/// Filled `width x height` rectangular structuring element
pub fn rect_mask(width: u32, height: u32) -> Mask {
    let kernel = GrayImage::from_pixel(width, height, Luma([255u8]));
    Mask::from_image(&kernel, (width / 2) as u8, (height / 2) as u8)
}

/// 3x3 cross-shaped structuring element
pub fn cross_mask() -> Mask {
    Mask::diamond(1)
}

/// Dilation then erosion, fusing features closer than the kernel
pub fn close(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    if width <= 1 && height <= 1 {
        return img.clone();
    }
    grayscale_close(img, &rect_mask(width, height))
}

/// Erode `iterations` times, then dilate `iterations` times
pub fn open(img: &GrayImage, mask: &Mask, iterations: u32) -> GrayImage {
    let mut opened = img.clone();
    for _ in 0..iterations {
        opened = grayscale_erode(&opened, mask);
    }
    for _ in 0..iterations {
        opened = grayscale_dilate(&opened, mask);
    }
    opened
}

/// Saturating per-pixel `a - b`
pub fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    ImageBuffer::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].saturating_sub(b.get_pixel(x, y)[0])])
    })
}

/// Thin a binary image down to its structural core.
///
/// Each pass erodes with a 3x3 cross and keeps what the matching opening
/// loses. Stops once nothing is left or an erosion changes nothing.
pub fn skeletonize(binary: &GrayImage) -> GrayImage {
    let (width, height) = binary.dimensions();
    let mut skeleton = GrayImage::new(width, height);

    // Nothing to thin from: a fully-foreground image has no boundary
    if binary.pixels().all(|p| p[0] > 0) {
        return skeleton;
    }

    let element = cross_mask();
    let mut img = binary.clone();

    while has_foreground(&img) {
        let eroded = grayscale_erode(&img, &element);
        let opened = grayscale_dilate(&eroded, &element);
        let residual = subtract(&img, &opened);

        for (out, res) in skeleton.pixels_mut().zip(residual.pixels()) {
            out[0] |= res[0];
        }

        if eroded == img {
            break;
        }
        img = eroded;
    }

    skeleton
}

/// Rescale a signed gradient map to 8 bits: subtract the minimum,
/// divide by `max / 255`, truncate. A constant map becomes all zero.
pub fn normalize_gradient(gradient: &ImageBuffer<Luma<i16>, Vec<i16>>) -> GrayImage {
    let (width, height) = gradient.dimensions();
    let min = gradient.pixels().map(|p| p[0]).min().unwrap_or(0) as f32;
    let max = gradient.pixels().map(|p| p[0]).max().unwrap_or(0) as f32;

    let div = (max - min) / 255.0;
    if div <= 0.0 {
        return GrayImage::new(width, height);
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let shifted = gradient.get_pixel(x, y)[0] as f32 - min;
        Luma([(shifted / div).clamp(0.0, 255.0) as u8])
    })
}

/// RGB to HSV with hue on a 0..=180 scale and saturation/value on 0..=255
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        max as u8,
    ]
}
