use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use platelocate::BoundingBox;

/// Half-open box shorthand: rows `y0..y1`, columns `x0..x1`
pub fn bbox(y0: u32, y1: u32, x0: u32, x1: u32) -> BoundingBox {
    BoundingBox::new(y0, y1, x0, x1).expect("valid test box")
}

/// Black map with white rectangles given as (y0, y1, x0, x1)
pub fn binary_map(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
    filled_map(width, height, 0, 255, rects)
}

/// Map of `background` with rectangles painted `value`
pub fn filled_map(width: u32, height: u32, background: u8, value: u8, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([background]));
    for &(y0, y1, x0, x1) in rects {
        let rect = Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0);
        draw_filled_rect_mut(&mut img, rect, Luma([value]));
    }
    img
}

pub fn uniform_photo(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

/// Where [`plate_photo`] puts its plate
pub const PLATE: (u32, u32, u32, u32) = (120, 150, 100, 220);

/// 320x200 dark street scene with a white 120x30 plate carrying dark glyphs
pub fn plate_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(320, 200, Rgb([60, 60, 60]));
    let (y0, y1, x0, x1) = PLATE;
    draw_filled_rect_mut(
        &mut img,
        Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0),
        Rgb([255, 255, 255]),
    );

    // Seven glyph strokes, kept clear of the plate border
    for i in 0..7 {
        let gx = x0 + 10 + i * 15;
        draw_filled_rect_mut(&mut img, Rect::at(gx as i32, (y0 + 6) as i32).of_size(6, 18), Rgb([20, 20, 20]));
    }

    DynamicImage::ImageRgb8(img)
}

/// Deterministic pseudo-random boxes inside `size`
pub fn scattered_boxes(count: usize, width: u32, height: u32, seed: u64) -> Vec<BoundingBox> {
    let mut state = seed;
    let mut next = move |bound: u32| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) % bound as u64) as u32
    };

    (0..count)
        .map(|_| {
            let x0 = next(width - 1);
            let y0 = next(height - 1);
            let x1 = x0 + 1 + next(width - x0);
            let y1 = y0 + 1 + next(height - y0);
            bbox(y0, y1.min(height), x0, x1.min(width))
        })
        .collect()
}
