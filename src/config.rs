//! Named numeric options for every stage of the localization pipeline.
//!
//! Nothing in the detector reads a compiled-in threshold: each stage takes its
//! slice of [`DetectorConfig`] as an explicit parameter. Defaults are tuned for
//! dashcam-style photographs roughly 640 pixels wide.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Largest structuring-element side accepted for closing/opening kernels.
pub const MAX_KERNEL: u32 = 255;

/// Largest hue value in the 0..=180 half-degree hue scale.
pub const MAX_HUE: u8 = 180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorConfig {
    pub preprocess: PreprocessConfig,
    pub gradient: GradientConfig,
    pub opening: OpeningConfig,
    pub color: ColorConfig,
    pub finder: FinderConfig,
    pub heuristics: HeuristicsConfig,
}

/// Edge-preserving smoothing applied after grayscale conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Bilateral window radius in pixels (window side is `2 * radius + 1`).
    pub bilateral_radius: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            bilateral_radius: 16,
            sigma_color: 40.0,
            sigma_space: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientConfig {
    /// Pixels strictly above this value are foreground before thinning.
    pub binarize_threshold: u8,
    /// Fraction of the smaller box a vertical/horizontal region pair must share.
    pub min_coincidence: f32,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            binarize_threshold: 127,
            min_coincidence: 0.5,
        }
    }
}

/// Rectangular opening whose residual isolates thin bright bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningConfig {
    pub kernel_width: u32,
    pub kernel_height: u32,
    pub iterations: u32,
}

impl Default for OpeningConfig {
    fn default() -> Self {
        Self {
            kernel_width: 3,
            kernel_height: 3,
            iterations: 15,
        }
    }
}

/// Inclusive HSV range. Hue uses the 0..=180 scale, saturation and value 0..=255.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub name: String,
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub fn new(name: impl Into<String>, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| ConfigError::ColorRange {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(fail("name must not be empty".to_string()));
        }
        for (c, channel) in ["hue", "saturation", "value"].iter().enumerate() {
            if self.lower[c] > self.upper[c] {
                return Err(fail(format!(
                    "{} lower bound {} exceeds upper bound {}",
                    channel, self.lower[c], self.upper[c]
                )));
            }
        }
        if self.upper[0] > MAX_HUE {
            return Err(fail(format!(
                "hue upper bound {} exceeds {}",
                self.upper[0], MAX_HUE
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// One mask is produced per range, in this order. Empty is valid.
    pub ranges: Vec<ColorRange>,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            ranges: vec![
                ColorRange::new("white", [0, 0, 180], [180, 40, 255]),
                ColorRange::new("yellow", [15, 80, 100], [35, 255, 255]),
            ],
        }
    }
}

/// Region acceptance rules for one detection method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderParams {
    /// Minimum distance from the map's background level for a foreground pixel.
    pub foreground_threshold: u8,
    /// Closing kernel fusing strokes into bands before labelling. 1x1 disables it.
    pub close_width: u32,
    pub close_height: u32,
    pub min_area_fraction: f32,
    pub max_area_fraction: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            foreground_threshold: 40,
            close_width: 9,
            close_height: 3,
            min_area_fraction: 0.001,
            max_area_fraction: 0.25,
            min_aspect_ratio: 1.5,
            max_aspect_ratio: 6.0,
        }
    }
}

impl FinderParams {
    fn validate(&self, method: &'static str) -> Result<(), ConfigError> {
        check_kernel(method, self.close_width)?;
        check_kernel(method, self.close_height)?;
        check_fraction(method, self.min_area_fraction)?;
        check_fraction(method, self.max_area_fraction)?;
        check_order(method, self.min_area_fraction, self.max_area_fraction)?;
        check_positive(method, self.min_aspect_ratio)?;
        check_positive(method, self.max_aspect_ratio)?;
        check_order(method, self.min_aspect_ratio, self.max_aspect_ratio)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub gradient: FinderParams,
    pub morphological: FinderParams,
    pub color: FinderParams,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            gradient: FinderParams {
                close_width: 15,
                ..FinderParams::default()
            },
            morphological: FinderParams::default(),
            color: FinderParams {
                foreground_threshold: 1,
                close_width: 5,
                close_height: 5,
                ..FinderParams::default()
            },
        }
    }
}

/// Thresholds for the post-aggregation prune/merge rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicsConfig {
    pub max_area_fraction: f32,
    pub max_width_fraction: f32,
    /// Largest horizontal gap, in pixels, between two fragments that still join.
    pub join_max_gap: u32,
    /// Minimum shared row span, as a fraction of the shorter fragment.
    pub join_min_row_overlap: f32,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            max_area_fraction: 0.4,
            max_width_fraction: 0.8,
            join_max_gap: 10,
            join_min_row_overlap: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Read a JSON configuration. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_kernel("preprocess.bilateral_radius", self.preprocess.bilateral_radius)?;
        check_positive("preprocess.sigma_color", self.preprocess.sigma_color)?;
        check_positive("preprocess.sigma_space", self.preprocess.sigma_space)?;

        check_fraction("gradient.min_coincidence", self.gradient.min_coincidence)?;

        check_kernel("opening.kernel_width", self.opening.kernel_width)?;
        check_kernel("opening.kernel_height", self.opening.kernel_height)?;
        if self.opening.iterations == 0 {
            return Err(ConfigError::NonPositive {
                option: "opening.iterations",
                value: 0.0,
            });
        }

        for range in &self.color.ranges {
            range.validate()?;
        }

        self.finder.gradient.validate("finder.gradient")?;
        self.finder.morphological.validate("finder.morphological")?;
        self.finder.color.validate("finder.color")?;

        check_fraction("heuristics.max_area_fraction", self.heuristics.max_area_fraction)?;
        check_fraction("heuristics.max_width_fraction", self.heuristics.max_width_fraction)?;
        check_fraction(
            "heuristics.join_min_row_overlap",
            self.heuristics.join_min_row_overlap,
        )?;
        Ok(())
    }
}

fn check_kernel(option: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_KERNEL {
        return Err(ConfigError::KernelSize {
            option,
            value,
            max: MAX_KERNEL,
        });
    }
    Ok(())
}

fn check_positive(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(ConfigError::NonPositive { option, value });
    }
    Ok(())
}

fn check_fraction(option: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::Fraction { option, value });
    }
    Ok(())
}

fn check_order(option: &'static str, lower: f32, upper: f32) -> Result<(), ConfigError> {
    if lower > upper {
        return Err(ConfigError::InvertedRange {
            option,
            lower,
            upper,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_smoothing_uses_33_pixel_window() {
        let preprocess = PreprocessConfig::default();
        assert_eq!(2 * preprocess.bilateral_radius + 1, 33);
        assert_eq!((preprocess.sigma_color, preprocess.sigma_space), (40.0, 40.0));
    }

    #[test]
    fn rejects_zero_kernel() {
        let mut config = DetectorConfig::default();
        config.opening.kernel_width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KernelSize { option: "opening.kernel_width", .. })
        ));
    }

    #[test]
    fn rejects_inverted_color_range() {
        let mut config = DetectorConfig::default();
        config.color.ranges.push(ColorRange::new("bad", [40, 0, 0], [20, 255, 255]));
        assert!(matches!(config.validate(), Err(ConfigError::ColorRange { .. })));
    }

    #[test]
    fn rejects_hue_above_scale() {
        let mut config = DetectorConfig::default();
        config.color.ranges = vec![ColorRange::new("red", [170, 0, 0], [200, 255, 255])];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_aspect_range() {
        let mut config = DetectorConfig::default();
        config.finder.morphological.min_aspect_ratio = 7.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { option: "finder.morphological", .. })
        ));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "heuristics": { "join_max_gap": 3 } }"#).unwrap();
        assert_eq!(config.heuristics.join_max_gap, 3);
        assert_eq!(config.heuristics.max_width_fraction, 0.8);
        assert_eq!(config.opening, OpeningConfig::default());
    }

    #[test]
    fn color_range_is_inclusive() {
        let range = ColorRange::new("w", [0, 0, 180], [180, 40, 255]);
        assert!(range.contains([0, 40, 180]));
        assert!(!range.contains([0, 41, 180]));
    }
}
