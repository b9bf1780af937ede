//! Overlay drawing for candidate and filtered boxes.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{BoundingBox, CandidateSet, MethodTag};

pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const PINK: Rgb<u8> = Rgb([255, 105, 180]);

pub fn method_color(method: MethodTag) -> Rgb<u8> {
    match method {
        MethodTag::Gradient => GREEN,
        MethodTag::Morphological => RED,
        MethodTag::Color => BLUE,
    }
}

/// Copy of `image` with a hollow rectangle per box
pub fn draw_boxes(image: &RgbImage, boxes: &[BoundingBox], color: Rgb<u8>) -> RgbImage {
    let mut canvas = image.clone();
    for bbox in boxes {
        let rect = Rect::at(bbox.x0 as i32, bbox.y0 as i32).of_size(bbox.width(), bbox.height());
        draw_hollow_rect_mut(&mut canvas, rect, color);
    }
    canvas
}

/// Every candidate, color-coded by the method that found it
pub fn draw_candidates(image: &DynamicImage, candidates: &CandidateSet) -> RgbImage {
    MethodTag::ALL.into_iter().fold(image.to_rgb8(), |canvas, method| {
        draw_boxes(&canvas, candidates.for_method(method), method_color(method))
    })
}

/// Boxes surviving the heuristic filter
pub fn draw_filtered(image: &DynamicImage, boxes: &[BoundingBox]) -> RgbImage {
    draw_boxes(&image.to_rgb8(), boxes, PINK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_only_touches_box_border() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let bbox = BoundingBox::new(5, 15, 10, 30).unwrap();
        let out = draw_filtered(&img, &[bbox]);
        assert_eq!(*out.get_pixel(10, 5), PINK);
        assert_eq!(*out.get_pixel(29, 14), PINK);
        assert_eq!(*out.get_pixel(20, 10), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(30, 15), Rgb([0, 0, 0]));
    }

    #[test]
    fn candidates_use_method_colors() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 40));
        let set = CandidateSet::new(
            vec![BoundingBox::new(0, 5, 0, 10).unwrap()],
            vec![BoundingBox::new(10, 15, 0, 10).unwrap()],
            vec![BoundingBox::new(20, 25, 0, 10).unwrap()],
        );
        let out = draw_candidates(&img, &set);
        assert_eq!(*out.get_pixel(0, 0), GREEN);
        assert_eq!(*out.get_pixel(0, 10), RED);
        assert_eq!(*out.get_pixel(0, 20), BLUE);
    }
}
