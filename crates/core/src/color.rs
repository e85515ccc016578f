//! Focus color extraction.
//!
//! Picks the single accent color used to theme a card from the raw bytes of
//! its cover or avatar. The image is downsampled to a small square, its
//! pixels are grouped by exact color, and the most prominent *vivid* color
//! wins. Images with no vivid color (greyscale, very dark) fall back to the
//! count-weighted average of every sampled pixel.
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::color::ColorExtractor;
//!
//! let extractor = ColorExtractor::default();
//! assert_eq!(extractor.extract(&[]), None);
//! ```

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};

/// Saturation below which a color is treated as near-greyscale and is not
/// eligible for vivid selection.
pub const VIVID_SATURATION_THRESHOLD: f32 = 0.15;

/// Value (brightness) below which a color is too dark to be vivid.
pub const MIN_VALUE: f32 = 0.15;

/// Edge length of the square the image is sampled down to.
pub const SAMPLE_SIZE: u32 = 64;

/// Neutral color substituted by callers when no focus color is available.
pub const DEFAULT_FOCUS_COLOR: &str = "#ffffff";

/// Configuration for focus color extraction.
///
/// # Example
///
/// ```rust
/// use bilicard_core::color::ColorConfig;
///
/// let config = ColorConfig::builder()
///     .min_saturation(0.38)
///     .sample_size(32)
///     .build();
/// assert_eq!(config.sample_size, 32);
/// ```
#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Edge length of the sampling grid (default: 64).
    pub sample_size: u32,

    /// Minimum HSV value for a vivid color (default: 0.15).
    pub min_value: f32,

    /// Minimum HSV saturation for a vivid color (default: [`VIVID_SATURATION_THRESHOLD`]).
    pub min_saturation: f32,

    /// Weight of saturation in the prominence score (default: 0.7).
    pub saturation_weight: f32,

    /// Weight of value in the prominence score (default: 0.3).
    pub value_weight: f32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            sample_size: SAMPLE_SIZE,
            min_value: MIN_VALUE,
            min_saturation: VIVID_SATURATION_THRESHOLD,
            saturation_weight: 0.7,
            value_weight: 0.3,
        }
    }
}

impl ColorConfig {
    /// Creates a new builder for ColorConfig.
    pub fn builder() -> ColorConfigBuilder {
        ColorConfigBuilder::new()
    }
}

/// Builder for ColorConfig.
pub struct ColorConfigBuilder {
    config: ColorConfig,
}

impl ColorConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ColorConfig::default() }
    }

    /// Sets the sampling grid edge length.
    pub fn sample_size(mut self, value: u32) -> Self {
        self.config.sample_size = value;
        self
    }

    /// Sets the minimum value for vivid colors.
    pub fn min_value(mut self, value: f32) -> Self {
        self.config.min_value = value;
        self
    }

    /// Sets the minimum saturation for vivid colors.
    pub fn min_saturation(mut self, value: f32) -> Self {
        self.config.min_saturation = value;
        self
    }

    /// Sets the saturation and value weights of the prominence score.
    pub fn weights(mut self, saturation: f32, value: f32) -> Self {
        self.config.saturation_weight = saturation;
        self.config.value_weight = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ColorConfig {
        self.config
    }
}

impl Default for ColorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }

    /// Saturation and value in the HSV model, both in `0.0..=1.0`.
    fn saturation_value(self) -> (f32, f32) {
        let [r, g, b] = self.0.map(|c| c as f32 / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let saturation = if max == 0.0 { 0.0 } else { (max - min) / max };
        (saturation, max)
    }
}

/// Extracts focus colors with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ColorExtractor {
    config: ColorConfig,
}

impl ColorExtractor {
    pub fn new(config: ColorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    /// Focus color of an encoded image as `#rrggbb`, or `None` when the
    /// bytes are empty or cannot be decoded.
    pub fn extract(&self, bytes: &[u8]) -> Option<String> {
        self.extract_rgb(bytes).map(Rgb::to_hex)
    }

    /// Same as [`extract`](Self::extract), returning the raw color.
    pub fn extract_rgb(&self, bytes: &[u8]) -> Option<Rgb> {
        if bytes.is_empty() {
            return None;
        }

        let decoded = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "image decode failed");
                return None;
            }
        };

        let size = self.config.sample_size.max(1);
        let sampled = imageops::resize(&decoded.to_rgb8(), size, size, FilterType::Triangle);

        let mut histogram: BTreeMap<Rgb, u32> = BTreeMap::new();
        for pixel in sampled.pixels() {
            *histogram.entry(Rgb(pixel.0)).or_insert(0) += 1;
        }

        self.most_vivid(&histogram).or_else(|| weighted_average(&histogram))
    }

    /// Highest-scoring eligible color. Iteration is in color order and only
    /// a strictly greater score replaces the current best, so ties resolve to
    /// the smallest color.
    fn most_vivid(&self, histogram: &BTreeMap<Rgb, u32>) -> Option<Rgb> {
        let mut best: Option<(Rgb, f32)> = None;

        for (&color, &count) in histogram {
            let (saturation, value) = color.saturation_value();
            if value < self.config.min_value || saturation < self.config.min_saturation {
                continue;
            }

            let score =
                (self.config.saturation_weight * saturation + self.config.value_weight * value) * count as f32;
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((color, score));
            }
        }

        best.map(|(color, _)| color)
    }
}

/// Count-weighted mean of every sampled color, rounded per channel.
fn weighted_average(histogram: &BTreeMap<Rgb, u32>) -> Option<Rgb> {
    let total: u64 = histogram.values().map(|&c| c as u64).sum();
    if total == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for (color, &count) in histogram {
        for (sum, channel) in sums.iter_mut().zip(color.0) {
            *sum += channel as u64 * count as u64;
        }
    }

    Some(Rgb(sums.map(|sum| ((sum + total / 2) / total).min(255) as u8)))
}

/// Focus color with the default configuration.
pub fn extract_focus_color(bytes: &[u8]) -> Option<String> {
    ColorExtractor::default().extract(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    fn encode(img: RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        encode(RgbImage::from_pixel(w, h, image::Rgb(rgb)))
    }

    #[test]
    fn test_empty_bytes_are_absent() {
        assert_eq!(extract_focus_color(&[]), None);
    }

    #[test]
    fn test_undecodable_bytes_are_absent() {
        assert_eq!(extract_focus_color(b"definitely not an image"), None);
    }

    #[test]
    fn test_uniform_red() {
        assert_eq!(extract_focus_color(&solid(64, 64, [255, 0, 0])), Some("#ff0000".to_string()));
    }

    #[test]
    fn test_uniform_grey_falls_back_to_average() {
        assert_eq!(extract_focus_color(&solid(64, 64, [128, 128, 128])), Some("#808080".to_string()));
    }

    #[test]
    fn test_dark_image_falls_back_to_average() {
        assert_eq!(extract_focus_color(&solid(16, 16, [20, 0, 0])), Some("#140000".to_string()));
    }

    #[test]
    fn test_non_square_input_is_resampled() {
        assert_eq!(extract_focus_color(&solid(300, 20, [0, 0, 255])), Some("#0000ff".to_string()));
    }

    #[test]
    fn test_alpha_is_discarded() {
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([0, 255, 0, 10]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        assert_eq!(extract_focus_color(&bytes), Some("#00ff00".to_string()));
    }

    #[test]
    fn test_vivid_minority_beats_grey_majority() {
        let mut hist = BTreeMap::new();
        hist.insert(Rgb([200, 200, 200]), 3000);
        hist.insert(Rgb([230, 40, 40]), 200);
        let extractor = ColorExtractor::default();
        assert_eq!(extractor.most_vivid(&hist), Some(Rgb([230, 40, 40])));
    }

    #[test]
    fn test_prominence_weights_saturation_over_frequency() {
        let mut hist = BTreeMap::new();
        // s = 1.0, v = 1.0 -> score 1.0 * 100
        hist.insert(Rgb([255, 0, 0]), 100);
        // s = 0.2, v = 1.0 -> score 0.44 * 200
        hist.insert(Rgb([255, 204, 204]), 200);
        assert_eq!(ColorExtractor::default().most_vivid(&hist), Some(Rgb([255, 0, 0])));
    }

    #[test]
    fn test_ties_resolve_to_smallest_color() {
        let mut hist = BTreeMap::new();
        hist.insert(Rgb([0, 0, 255]), 10);
        hist.insert(Rgb([255, 0, 0]), 10);
        assert_eq!(ColorExtractor::default().most_vivid(&hist), Some(Rgb([0, 0, 255])));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let mut hist = BTreeMap::new();
        hist.insert(Rgb([255, 204, 204]), 10);
        assert!(ColorExtractor::default().most_vivid(&hist).is_some());

        let strict = ColorExtractor::new(ColorConfig::builder().min_saturation(0.38).build());
        assert_eq!(strict.most_vivid(&hist), None);
    }

    #[test]
    fn test_weighted_average_rounds() {
        let mut hist = BTreeMap::new();
        hist.insert(Rgb([0, 0, 0]), 1);
        hist.insert(Rgb([255, 255, 255]), 1);
        assert_eq!(weighted_average(&hist), Some(Rgb([128, 128, 128])));
        assert_eq!(weighted_average(&BTreeMap::new()), None);
    }

    #[test]
    fn test_deterministic() {
        let mut img = RgbImage::new(40, 40);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgb([(x * 6) as u8, (y * 6) as u8, 90]);
        }
        let bytes = encode(img);
        assert_eq!(extract_focus_color(&bytes), extract_focus_color(&bytes));
    }

    #[test]
    fn test_hex_is_lowercase() {
        assert_eq!(Rgb([0xAB, 0xCD, 0xEF]).to_hex(), "#abcdef");
    }
}
