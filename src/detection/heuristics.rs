//! Post-aggregation prune/merge rules over the candidates of all methods.

use tracing::debug;

use crate::config::HeuristicsConfig;
use crate::models::{BoundingBox, ImageSize};

fn within_area(bbox: &BoundingBox, image_size: ImageSize, max_area_fraction: f32) -> bool {
    bbox.area() as f64 <= max_area_fraction as f64 * image_size.area() as f64
}

fn not_vertical(bbox: &BoundingBox) -> bool {
    bbox.height() <= bbox.width()
}

fn within_width(bbox: &BoundingBox, image_width: u32, max_width_fraction: f32) -> bool {
    bbox.width() as f64 <= max_width_fraction as f64 * image_width as f64
}

/// True when `bbox` survives all three prune rules
pub fn passes_prune_rules(bbox: &BoundingBox, image_size: ImageSize, config: &HeuristicsConfig) -> bool {
    within_area(bbox, image_size, config.max_area_fraction)
        && not_vertical(bbox)
        && within_width(bbox, image_size.width, config.max_width_fraction)
}

/// Drop boxes covering more than `max_area_fraction` of the image
pub fn remove_big_areas(candidates: &[BoundingBox], image_size: ImageSize, max_area_fraction: f32) -> Vec<BoundingBox> {
    candidates
        .iter()
        .filter(|c| within_area(c, image_size, max_area_fraction))
        .copied()
        .collect()
}

/// Drop boxes taller than they are wide
pub fn remove_vertical(candidates: &[BoundingBox]) -> Vec<BoundingBox> {
    candidates.iter().filter(|c| not_vertical(c)).copied().collect()
}

/// Drop boxes wider than `max_width_fraction` of the image width
pub fn remove_horizontal(candidates: &[BoundingBox], image_width: u32, max_width_fraction: f32) -> Vec<BoundingBox> {
    candidates
        .iter()
        .filter(|c| within_width(c, image_width, max_width_fraction))
        .copied()
        .collect()
}

/// Merge horizontally adjacent, vertically aligned pairs into their union.
///
/// Single pass: each box takes part in at most one merge, and a merged box is
/// not reconsidered, so a chain of three fragments collapses to two.
pub fn join_separated(candidates: &[BoundingBox], max_gap: u32, min_row_overlap: f32) -> Vec<BoundingBox> {
    join_pairs(candidates, max_gap, min_row_overlap, |_| true)
}

/// [`join_separated`] that leaves a pair unmerged when their union would
/// fail one of the prune rules
pub fn join_within_limits(candidates: &[BoundingBox], image_size: ImageSize, config: &HeuristicsConfig) -> Vec<BoundingBox> {
    join_pairs(candidates, config.join_max_gap, config.join_min_row_overlap, |union| {
        passes_prune_rules(union, image_size, config)
    })
}

fn join_pairs(
    candidates: &[BoundingBox],
    max_gap: u32,
    min_row_overlap: f32,
    admit: impl Fn(&BoundingBox) -> bool,
) -> Vec<BoundingBox> {
    let mut used = vec![false; candidates.len()];
    let mut joined = Vec::with_capacity(candidates.len());

    for i in 0..candidates.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let current = candidates[i];

        let partner = (i + 1..candidates.len()).find(|&j| {
            !used[j]
                && are_separated_halves(&current, &candidates[j], max_gap, min_row_overlap)
                && admit(&current.union(&candidates[j]))
        });

        match partner {
            Some(j) => {
                used[j] = true;
                joined.push(current.union(&candidates[j]));
            }
            None => joined.push(current),
        }
    }

    joined
}

fn are_separated_halves(a: &BoundingBox, b: &BoundingBox, max_gap: u32, min_row_overlap: f32) -> bool {
    let shorter = a.height().min(b.height());
    let aligned = a.row_overlap(b) as f32 >= min_row_overlap * shorter as f32;
    aligned && a.horizontal_gap(b) <= max_gap as i64
}

/// Run the rules in their fixed order, each consuming the previous output.
/// Every returned box satisfies all three prune rules.
pub fn filter(candidates: &[BoundingBox], image_size: ImageSize, config: &HeuristicsConfig) -> Vec<BoundingBox> {
    let kept = remove_big_areas(candidates, image_size, config.max_area_fraction);
    debug!(before = candidates.len(), after = kept.len(), "remove_big_areas");

    let kept_count = kept.len();
    let kept = remove_vertical(&kept);
    debug!(before = kept_count, after = kept.len(), "remove_vertical");

    let kept_count = kept.len();
    let kept = remove_horizontal(&kept, image_size.width, config.max_width_fraction);
    debug!(before = kept_count, after = kept.len(), "remove_horizontal");

    let kept_count = kept.len();
    let kept = join_within_limits(&kept, image_size, config);
    debug!(before = kept_count, after = kept.len(), "join_separated");

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(y0: u32, y1: u32, x0: u32, x1: u32) -> BoundingBox {
        BoundingBox::new(y0, y1, x0, x1).unwrap()
    }

    #[test]
    fn square_box_is_not_vertical() {
        assert_eq!(remove_vertical(&[bbox(0, 10, 0, 10)]).len(), 1);
        assert!(remove_vertical(&[bbox(0, 11, 0, 10)]).is_empty());
    }

    #[test]
    fn big_area_limit_is_inclusive() {
        let size = ImageSize::new(100, 100);
        assert_eq!(remove_big_areas(&[bbox(0, 50, 0, 80)], size, 0.4).len(), 1);
        assert!(remove_big_areas(&[bbox(0, 50, 0, 81)], size, 0.4).is_empty());
    }

    #[test]
    fn chain_of_three_collapses_to_two_in_one_pass() {
        let boxes = [bbox(10, 20, 0, 20), bbox(10, 20, 22, 40), bbox(10, 20, 42, 60)];
        let joined = join_separated(&boxes, 5, 0.5);
        assert_eq!(joined, vec![bbox(10, 20, 0, 40), bbox(10, 20, 42, 60)]);
    }

    #[test]
    fn misaligned_rows_do_not_join() {
        let boxes = [bbox(10, 20, 0, 20), bbox(18, 28, 22, 40)];
        assert_eq!(join_separated(&boxes, 5, 0.5).len(), 2);
    }

    #[test]
    fn join_is_refused_when_union_breaks_a_prune_rule() {
        let size = ImageSize::new(320, 200);
        let config = HeuristicsConfig::default();

        let too_wide = [bbox(50, 70, 0, 140), bbox(50, 70, 145, 285)];
        assert_eq!(join_within_limits(&too_wide, size, &config), too_wide.to_vec());

        let too_tall = [bbox(0, 10, 0, 12), bbox(5, 15, 2, 14)];
        assert_eq!(join_within_limits(&too_tall, size, &config), too_tall.to_vec());
        assert_eq!(join_separated(&too_tall, 10, 0.5), vec![bbox(0, 15, 0, 14)]);
    }

    #[test]
    fn partner_search_skips_unrelated_boxes() {
        let boxes = [bbox(10, 20, 0, 20), bbox(80, 90, 0, 30), bbox(10, 20, 24, 40)];
        let joined = join_separated(&boxes, 5, 0.5);
        assert_eq!(joined, vec![bbox(10, 20, 0, 40), bbox(80, 90, 0, 30)]);
    }
}
