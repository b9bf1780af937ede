mod common;

use common::*;
use platelocate::config::HeuristicsConfig;
use platelocate::detection::heuristics;

const SIZE: ImageSize = ImageSize { width: 320, height: 200 };

#[test]
fn each_prune_rule_only_removes_failing_boxes() {
    let boxes = scattered_boxes(200, SIZE.width, SIZE.height, 7);

    let big = heuristics::remove_big_areas(&boxes, SIZE, 0.4);
    let expected: Vec<BoundingBox> = boxes
        .iter()
        .filter(|b| b.area() as f64 <= 0.4 * SIZE.area() as f64)
        .copied()
        .collect();
    assert_eq!(big, expected);

    let vertical = heuristics::remove_vertical(&boxes);
    assert!(vertical.len() <= boxes.len());
    assert_eq!(vertical.len(), boxes.iter().filter(|b| b.height() <= b.width()).count());

    let horizontal = heuristics::remove_horizontal(&boxes, SIZE.width, 0.8);
    assert_eq!(horizontal.len(), boxes.iter().filter(|b| b.width() as f64 <= 0.8 * 320.0).count());
}

#[test]
fn filter_output_never_grows() {
    let config = HeuristicsConfig::default();
    for seed in 1..20 {
        let boxes = scattered_boxes(60, SIZE.width, SIZE.height, seed);
        let filtered = heuristics::filter(&boxes, SIZE, &config);
        assert!(filtered.len() <= boxes.len());
        for b in &filtered {
            assert!(b.fits_within(SIZE));
        }
    }
}

fn assert_passes_prune_rules(b: &BoundingBox, config: &HeuristicsConfig) {
    assert!(b.area() as f64 <= config.max_area_fraction as f64 * SIZE.area() as f64, "too big: {}", b);
    assert!(b.height() <= b.width(), "vertical: {}", b);
    assert!(b.width() as f64 <= config.max_width_fraction as f64 * SIZE.width as f64, "too wide: {}", b);
}

#[test]
fn filter_survivors_satisfy_all_predicates_after_join() {
    let config = HeuristicsConfig { join_max_gap: 40, join_min_row_overlap: 0.2, ..HeuristicsConfig::default() };
    for seed in 1..30 {
        let boxes = scattered_boxes(120, SIZE.width, SIZE.height, seed);
        for b in &heuristics::filter(&boxes, SIZE, &config) {
            assert_passes_prune_rules(b, &config);
        }
    }
}

#[test]
fn filter_leaves_pair_apart_when_union_would_be_pruned() {
    let config = HeuristicsConfig::default();

    let wide_halves = [bbox(50, 70, 0, 140), bbox(50, 70, 145, 285)];
    let filtered = heuristics::filter(&wide_halves, SIZE, &config);
    assert_eq!(filtered, wide_halves.to_vec());

    let offset_fragments = [bbox(0, 10, 0, 12), bbox(5, 15, 2, 14)];
    let filtered = heuristics::filter(&offset_fragments, SIZE, &config);
    assert_eq!(filtered, offset_fragments.to_vec());
    for b in &filtered {
        assert_passes_prune_rules(b, &config);
    }
}

#[test]
fn joined_boxes_cover_their_parts() {
    let boxes = scattered_boxes(80, SIZE.width, SIZE.height, 3);
    let joined = heuristics::join_separated(&boxes, 15, 0.3);
    assert!(joined.len() <= boxes.len());

    // Every input box is inside some output box, and outputs are never smaller
    // than the largest box they absorbed
    for b in &boxes {
        let container = joined
            .iter()
            .find(|j| j.y0 <= b.y0 && j.y1 >= b.y1 && j.x0 <= b.x0 && j.x1 >= b.x1)
            .expect("input box is covered");
        assert!(container.area() >= b.area());
    }
}

#[test]
fn join_merges_aligned_halves_in_any_order() {
    let right = bbox(40, 60, 95, 130);
    let left = bbox(40, 60, 50, 90);
    assert_eq!(heuristics::join_separated(&[right, left], 10, 0.5), vec![bbox(40, 60, 50, 130)]);
}

#[test]
fn empty_input_passes_through() {
    assert!(heuristics::filter(&[], SIZE, &HeuristicsConfig::default()).is_empty());
}
