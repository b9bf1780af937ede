use image::GenericImageView;
use std::fmt;

/// Axis-aligned candidate plate region in pixel coordinates.
///
/// Rows `y0..y1` and columns `x0..x1` are half-open, so a valid box always
/// satisfies `y0 < y1` and `x0 < x1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub y0: u32,
    pub y1: u32,
    pub x0: u32,
    pub x1: u32,
}

impl BoundingBox {
    /// Returns `None` for empty or inverted extents.
    pub fn new(y0: u32, y1: u32, x0: u32, x1: u32) -> Option<Self> {
        if y0 < y1 && x0 < x1 {
            Some(Self { y0, y1, x0, x1 })
        } else {
            None
        }
    }

    /// Box covering a whole image of the given size.
    pub fn full(size: ImageSize) -> Option<Self> {
        Self::new(0, size.height, 0, size.width)
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            y0: self.y0.min(other.y0),
            y1: self.y1.max(other.y1),
            x0: self.x0.min(other.x0),
            x1: self.x1.max(other.x1),
        }
    }

    pub fn intersection_area(&self, other: &Self) -> u64 {
        let rows = self.row_overlap(other) as u64;
        let cols = (self.x1.min(other.x1) as i64 - self.x0.max(other.x0) as i64).max(0) as u64;
        rows * cols
    }

    /// Number of rows both boxes span.
    pub fn row_overlap(&self, other: &Self) -> u32 {
        (self.y1.min(other.y1) as i64 - self.y0.max(other.y0) as i64).max(0) as u32
    }

    /// Empty columns between the boxes; negative when they overlap horizontally.
    pub fn horizontal_gap(&self, other: &Self) -> i64 {
        self.x0.max(other.x0) as i64 - self.x1.min(other.x1) as i64
    }

    pub fn fits_within(&self, size: ImageSize) -> bool {
        self.y1 <= size.height && self.x1 <= size.width
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.y0, self.y1, self.x0, self.x1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of<I: GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Provenance of a candidate box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodTag {
    Gradient,
    Morphological,
    Color,
}

impl MethodTag {
    pub const ALL: [MethodTag; 3] = [MethodTag::Gradient, MethodTag::Morphological, MethodTag::Color];

    pub fn name(&self) -> &'static str {
        match self {
            MethodTag::Gradient => "gradient",
            MethodTag::Morphological => "morphological",
            MethodTag::Color => "color",
        }
    }
}

impl fmt::Display for MethodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Connected foreground region found by labelling a binary map.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Region {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            y0: self.min_y,
            y1: self.max_y + 1,
            x0: self.min_x,
            x1: self.max_x + 1,
        }
    }
}

/// Candidates for one image, one list per detection method.
///
/// Built once by [`CandidateSet::new`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    gradient: Vec<BoundingBox>,
    morphological: Vec<BoundingBox>,
    color: Vec<BoundingBox>,
}

impl CandidateSet {
    pub fn new(
        gradient: Vec<BoundingBox>,
        morphological: Vec<BoundingBox>,
        color: Vec<BoundingBox>,
    ) -> Self {
        Self {
            gradient,
            morphological,
            color,
        }
    }

    pub fn gradient(&self) -> &[BoundingBox] {
        &self.gradient
    }

    pub fn morphological(&self) -> &[BoundingBox] {
        &self.morphological
    }

    pub fn color(&self) -> &[BoundingBox] {
        &self.color
    }

    pub fn for_method(&self, method: MethodTag) -> &[BoundingBox] {
        match method {
            MethodTag::Gradient => &self.gradient,
            MethodTag::Morphological => &self.morphological,
            MethodTag::Color => &self.color,
        }
    }

    /// Gradient, then morphological, then color candidates.
    pub fn all(&self) -> Vec<BoundingBox> {
        self.tagged().map(|(_, bbox)| bbox).collect()
    }

    pub fn tagged(&self) -> impl Iterator<Item = (MethodTag, BoundingBox)> + '_ {
        MethodTag::ALL
            .into_iter()
            .flat_map(move |tag| self.for_method(tag).iter().map(move |bbox| (tag, *bbox)))
    }

    pub fn len(&self) -> usize {
        self.gradient.len() + self.morphological.len() + self.color.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
