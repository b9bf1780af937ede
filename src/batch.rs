//! Directory batch processing: load each photograph, localize plates per
//! vehicle crop, save annotated overlays. One bad image never stops the batch.

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::detection::{PlateLocator, VehicleDetector, VehicleLocalization};
use crate::pipeline::PipelineContext;
use crate::render;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Image files under `input` in sorted path order. A single file is accepted as-is.
pub fn list_images(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(input)
        .with_context(|| format!("Failed to read input directory {}", input.display()))?
    {
        let path = entry?.path();
        if is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn load_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))
}

/// Output label per input: its file stem, or `<stem>_<ext>` when another
/// input shares the stem
pub fn output_labels(paths: &[PathBuf]) -> Vec<String> {
    let stem = |path: &Path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    };
    let stems: Vec<String> = paths.iter().map(|p| stem(p)).collect();

    paths
        .iter()
        .zip(&stems)
        .map(|(path, stem)| {
            let shared = stems.iter().filter(|s| *s == stem).count() > 1;
            match path.extension() {
                Some(ext) if shared => format!("{}_{}", stem, ext.to_string_lossy()),
                _ => stem.clone(),
            }
        })
        .collect()
}

/// Writes `<label>_<counter>.png` files into one output directory
pub struct ImageSaver {
    output_dir: PathBuf,
}

impl ImageSaver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_path(&self, label: &str, counter: usize) -> PathBuf {
        self.output_dir.join(format!("{}_{}.png", label, counter))
    }

    pub fn save(&self, label: &str, counter: usize, image: &RgbImage) -> Result<PathBuf> {
        let path = self.output_path(label, counter);
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save {}: {}", path.display(), e))?;
        Ok(path)
    }
}

/// Results for one successfully processed photograph
#[derive(Debug)]
pub struct ImageReport {
    pub path: PathBuf,
    pub vehicles: Vec<VehicleLocalization>,
}

/// A photograph that could not be processed, with the reason
#[derive(Debug)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<ImageReport>,
    pub skipped: Vec<SkippedImage>,
}

/// Localize plates in every image under `input`.
///
/// For each vehicle crop two overlays are saved: all candidates
/// (counter `2 * crop`) and the filtered boxes (counter `2 * crop + 1`).
pub fn process_batch(
    locator: &PlateLocator,
    detector: &dyn VehicleDetector,
    input: &Path,
    saver: &ImageSaver,
    context: &PipelineContext,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();

    let paths = list_images(input)?;
    let labels = output_labels(&paths);

    for (path, label) in paths.into_iter().zip(labels) {
        info!(path = %path.display(), "processing image");
        match process_one(locator, detector, &path, &label, saver, context) {
            Ok(vehicles) => summary.processed.push(ImageReport { path, vehicles }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping image");
                summary.skipped.push(SkippedImage {
                    path,
                    reason: format!("{:#}", e),
                });
            }
        }
    }

    Ok(summary)
}

fn process_one(
    locator: &PlateLocator,
    detector: &dyn VehicleDetector,
    path: &Path,
    label: &str,
    saver: &ImageSaver,
    context: &PipelineContext,
) -> Result<Vec<VehicleLocalization>> {
    let image = load_image(path)?;
    let vehicles = locator.locate_vehicles(&image, detector, &context.scoped(label))?;

    for (idx, vehicle) in vehicles.iter().enumerate() {
        let region = vehicle.region;
        let crop = image.crop_imm(region.x0, region.y0, region.width(), region.height());
        let candidates = render::draw_candidates(&crop, &vehicle.localization.candidates);
        saver.save(label, 2 * idx, &candidates)?;
        let filtered = render::draw_filtered(&crop, &vehicle.localization.filtered);
        saver.save(label, 2 * idx + 1, &filtered)?;
    }

    Ok(vehicles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_uses_label_and_counter() {
        let saver = ImageSaver {
            output_dir: PathBuf::from("/out"),
        };
        assert_eq!(saver.output_path("car_01", 3), PathBuf::from("/out/car_01_3.png"));
    }

    #[test]
    fn shared_stems_keep_their_extension() {
        let paths = [
            PathBuf::from("/in/car.jpg"),
            PathBuf::from("/in/car.png"),
            PathBuf::from("/in/van.png"),
        ];
        assert_eq!(output_labels(&paths), vec!["car_jpg", "car_png", "van"]);
    }
}
