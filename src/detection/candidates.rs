//! Candidate Finder: turns one processed map (or the gradient pair) into
//! plate-shaped bounding boxes.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::stats::histogram;
use tracing::debug;

use crate::config::FinderParams;
use crate::detection::{contours, preprocessing};
use crate::error::DetectError;
use crate::models::{BoundingBox, ImageSize, MethodTag, Region};

/// A processed map together with the method that produced it
#[derive(Debug, Clone, Copy)]
pub enum MethodInput<'a> {
    Gradient {
        vertical: &'a GrayImage,
        horizontal: &'a GrayImage,
        /// Fraction of the smaller box a vertical/horizontal pair must share
        min_coincidence: f32,
    },
    Morphological(&'a GrayImage),
    Color(&'a GrayImage),
}

impl MethodInput<'_> {
    pub fn tag(&self) -> MethodTag {
        match self {
            MethodInput::Gradient { .. } => MethodTag::Gradient,
            MethodInput::Morphological(_) => MethodTag::Morphological,
            MethodInput::Color(_) => MethodTag::Color,
        }
    }
}

/// Result of one candidate search. Finding nothing is a routine outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Found(Vec<BoundingBox>),
    NoCandidates,
}

impl CandidateOutcome {
    fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        if boxes.is_empty() {
            CandidateOutcome::NoCandidates
        } else {
            CandidateOutcome::Found(boxes)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CandidateOutcome::NoCandidates)
    }

    /// Collapse "no candidates" to an empty list
    pub fn into_boxes(self) -> Vec<BoundingBox> {
        match self {
            CandidateOutcome::Found(boxes) => boxes,
            CandidateOutcome::NoCandidates => Vec::new(),
        }
    }
}

/// Extract plate-plausible bounding boxes from a processed map.
///
/// Foreground regions are labelled with 8-connectivity after a closing with
/// the method's kernel; for the gradient method a region must coincide in
/// both maps. Boxes come back in scan order.
pub fn find_candidates(input: MethodInput<'_>, params: &FinderParams) -> Result<CandidateOutcome, DetectError> {
    let method = input.tag();

    // A single-intensity map has no bands to find
    let featureless = match input {
        MethodInput::Gradient { vertical, horizontal, .. } => {
            preprocessing::is_uniform(vertical) || preprocessing::is_uniform(horizontal)
        }
        MethodInput::Morphological(map) | MethodInput::Color(map) => preprocessing::is_uniform(map),
    };

    let boxes: Vec<BoundingBox> = match input {
        MethodInput::Gradient { vertical, horizontal, min_coincidence } => {
            if vertical.dimensions() != horizontal.dimensions() {
                return Err(DetectError::MapSizeMismatch {
                    vertical: vertical.dimensions(),
                    horizontal: horizontal.dimensions(),
                });
            }
            let size = ImageSize::of(vertical);
            if featureless {
                debug!(method = %method, "featureless map, no candidates");
                return Ok(CandidateOutcome::NoCandidates);
            }
            let vertical_regions = band_regions(vertical, histogram_mode(vertical), params);
            let horizontal_regions = band_regions(horizontal, histogram_mode(horizontal), params);

            coincident_boxes(&vertical_regions, &horizontal_regions, min_coincidence)
                .into_iter()
                .filter(|bbox| is_plate_shaped(bbox, size, params))
                .collect()
        }
        MethodInput::Morphological(map) | MethodInput::Color(map) => {
            let size = ImageSize::of(map);
            if featureless {
                debug!(method = %method, "featureless map, no candidates");
                return Ok(CandidateOutcome::NoCandidates);
            }
            band_regions(map, 0, params)
                .iter()
                .map(Region::bounding_box)
                .filter(|bbox| is_plate_shaped(bbox, size, params))
                .collect()
        }
    };

    debug!(method = %method, candidates = boxes.len(), "candidate search finished");
    Ok(CandidateOutcome::from_boxes(boxes))
}

/// Binarize around the background level, close, and label
fn band_regions(map: &GrayImage, background: u8, params: &FinderParams) -> Vec<Region> {
    let threshold = params.foreground_threshold.max(1);
    let binary: GrayImage = ImageBuffer::from_fn(map.width(), map.height(), |x, y| {
        if map.get_pixel(x, y)[0].abs_diff(background) >= threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    let closed = preprocessing::close(&binary, params.close_width, params.close_height);
    contours::find_regions(&closed)
}

/// Most frequent intensity: the level a normalized gradient map sits at where
/// there is no edge
fn histogram_mode(map: &GrayImage) -> u8 {
    histogram(map).channels[0]
        .iter()
        .enumerate()
        .max_by_key(|&(value, count)| (*count, std::cmp::Reverse(value)))
        .map(|(value, _)| value as u8)
        .unwrap_or(0)
}

/// Pair each vertical region with the unused horizontal region it overlaps most.
/// Accepted pairs become their union box.
fn coincident_boxes(vertical: &[Region], horizontal: &[Region], min_coincidence: f32) -> Vec<BoundingBox> {
    let horizontal_boxes: Vec<BoundingBox> = horizontal.iter().map(Region::bounding_box).collect();
    let mut used = vec![false; horizontal_boxes.len()];
    let mut boxes = Vec::new();

    for region in vertical {
        let v = region.bounding_box();

        let best = horizontal_boxes
            .iter()
            .enumerate()
            .filter(|(idx, _)| !used[*idx])
            .map(|(idx, h)| (idx, coincidence(&v, h)))
            .filter(|(_, score)| *score >= min_coincidence)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));

        if let Some((idx, _)) = best {
            used[idx] = true;
            boxes.push(v.union(&horizontal_boxes[idx]));
        }
    }

    boxes
}

/// Shared area as a fraction of the smaller box
fn coincidence(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let smaller = a.area().min(b.area());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection_area(b) as f32 / smaller as f32
}

/// Area and aspect gates. A box spanning the whole map is never a plate.
fn is_plate_shaped(bbox: &BoundingBox, size: ImageSize, params: &FinderParams) -> bool {
    if BoundingBox::full(size).as_ref() == Some(bbox) {
        return false;
    }
    let image_area = size.area() as f64;
    let area = bbox.area() as f64;
    let aspect = bbox.aspect_ratio();

    area >= params.min_area_fraction as f64 * image_area
        && area <= params.max_area_fraction as f64 * image_area
        && aspect >= params.min_aspect_ratio
        && aspect <= params.max_aspect_ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(y0: u32, y1: u32, x0: u32, x1: u32) -> BoundingBox {
        BoundingBox::new(y0, y1, x0, x1).unwrap()
    }

    fn region(b: BoundingBox) -> Region {
        Region {
            label: 1,
            min_x: b.x0,
            min_y: b.y0,
            max_x: b.x1 - 1,
            max_y: b.y1 - 1,
            pixel_count: b.area() as u32,
        }
    }

    #[test]
    fn mode_prefers_lowest_on_ties() {
        let img = ImageBuffer::from_fn(4, 1, |x, _| Luma([if x < 2 { 9u8 } else { 3u8 }]));
        assert_eq!(histogram_mode(&img), 3);
    }

    #[test]
    fn whole_map_box_is_never_plate_shaped() {
        let params = FinderParams { max_area_fraction: 1.0, max_aspect_ratio: 10.0, ..FinderParams::default() };
        let size = ImageSize::new(200, 100);
        assert!(!is_plate_shaped(&bbox(0, 100, 0, 200), size, &params));
        assert!(is_plate_shaped(&bbox(0, 99, 0, 200), size, &params));
    }

    #[test]
    fn coincident_pair_becomes_union() {
        let v = [region(bbox(10, 20, 10, 50))];
        let h = [region(bbox(12, 22, 12, 48)), region(bbox(60, 70, 0, 40))];
        let boxes = coincident_boxes(&v, &h, 0.5);
        assert_eq!(boxes, vec![bbox(10, 22, 10, 50)]);
    }

    #[test]
    fn region_without_partner_is_dropped() {
        let v = [region(bbox(10, 20, 10, 50))];
        let h = [region(bbox(40, 50, 10, 50))];
        assert!(coincident_boxes(&v, &h, 0.5).is_empty());
    }

    #[test]
    fn horizontal_region_pairs_once() {
        let v = [region(bbox(10, 20, 10, 50)), region(bbox(10, 20, 12, 50))];
        let h = [region(bbox(10, 20, 10, 50))];
        assert_eq!(coincident_boxes(&v, &h, 0.5).len(), 1);
    }

    #[test]
    fn shape_rules_use_image_area_and_aspect() {
        let params = FinderParams {
            min_area_fraction: 0.01,
            max_area_fraction: 0.5,
            min_aspect_ratio: 1.5,
            max_aspect_ratio: 6.0,
            ..FinderParams::default()
        };
        let size = ImageSize::new(200, 100);
        assert!(is_plate_shaped(&bbox(40, 60, 50, 130), size, &params));
        assert!(!is_plate_shaped(&bbox(40, 42, 50, 54), size, &params));
        assert!(!is_plate_shaped(&bbox(0, 20, 0, 180), size, &params));
        assert!(!is_plate_shaped(&bbox(0, 90, 0, 190), size, &params));
    }
}
