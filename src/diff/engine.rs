//! Built-in pixel diff engine
//!
//! Compares two RGBA buffers pixel by pixel with per-mode tolerances and
//! renders a diff image where mismatches are painted in the highlight color.
//!
//! Pixel classification:
//! - channels are "similar" when equal or closer than the mode's tolerance
//! - brightness is the usual luma estimate `0.3 R + 0.59 G + 0.11 B`
//! - in IgnoreColors mode only brightness and alpha are compared
//! - in IgnoreAntialiasing mode a mismatch on an anti-aliased edge pixel
//!   is forgiven when its brightness is still similar

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::config::Settings;
use crate::state::data::{DiffResult, HighlightColor, SensitivityMode};

/// Sampling step used for images above the large-image threshold
const LARGE_IMAGE_SKIP: u32 = 6;

/// Hue distance above which a neighbour counts as a different hue
const HUE_DISTANCE: f32 = 0.3;

/// The pixel-level diff primitive
///
/// Implementations must be pure: identical inputs give an identical
/// mismatch percentage. They are called from tokio's blocking pool.
pub trait DiffEngine: Send + Sync {
    fn compare(
        &self,
        reference: &RgbaImage,
        candidate: &RgbaImage,
        mode: SensitivityMode,
        highlight: HighlightColor,
    ) -> Result<DiffResult, String>;
}

/// Tunables of [`PixelDiffEngine`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Alpha multiplier for matching pixels in the diff image
    pub transparency: f32,
    /// Sample instead of scanning every pixel above this size (0 = never)
    pub large_image_threshold: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            transparency: 0.3,
            large_image_threshold: 1200,
        }
    }
}

impl From<&Settings> for EngineSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            transparency: settings.diff_transparency,
            large_image_threshold: settings.large_image_threshold,
        }
    }
}

/// Per-mode tolerances, in 0-255 channel units
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tolerance {
    red: f32,
    green: f32,
    blue: f32,
    alpha: f32,
    min_brightness: f32,
    max_brightness: f32,
}

impl Tolerance {
    fn for_mode(mode: SensitivityMode) -> Self {
        match mode {
            SensitivityMode::Exact | SensitivityMode::IgnoreColors => Tolerance {
                red: 16.0,
                green: 16.0,
                blue: 16.0,
                alpha: 16.0,
                min_brightness: 16.0,
                max_brightness: 240.0,
            },
            SensitivityMode::IgnoreAntialiasing => Tolerance {
                red: 32.0,
                green: 32.0,
                blue: 32.0,
                alpha: 32.0,
                min_brightness: 64.0,
                max_brightness: 96.0,
            },
        }
    }
}

/// A pixel with its derived brightness and hue
#[derive(Debug, Clone, Copy)]
struct PixelInfo {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
    brightness: f32,
    hue: f32,
}

impl PixelInfo {
    fn from_rgba(px: &Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0.map(f32::from);
        Self {
            r,
            g,
            b,
            a,
            brightness: brightness(r, g, b),
            hue: hue(r, g, b),
        }
    }

    fn same_rgb(&self, other: &PixelInfo) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

/// What a single pixel pair turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Similar colors: copied faded into the diff image
    Similar,
    /// Similar brightness only: copied as faded grayscale
    SimilarBrightness,
    Mismatch,
}

fn brightness(r: f32, g: f32, b: f32) -> f32 {
    0.3 * r + 0.59 * g + 0.11 * b
}

/// Hue in [0, 1)
fn hue(r: f32, g: f32, b: f32) -> f32 {
    let (r, g, b) = (r / 255.0, g / 255.0, b / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    if max == min {
        return 0.0;
    }

    let d = max - min;
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    h / 6.0
}

fn is_similar(a: f32, b: f32, tolerance: f32) -> bool {
    a == b || (a - b).abs() < tolerance
}

/// The default engine
#[derive(Debug, Clone, Default)]
pub struct PixelDiffEngine {
    settings: EngineSettings,
}

impl PixelDiffEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Shared handle for the async adapter
    pub fn shared(settings: EngineSettings) -> Arc<dyn DiffEngine> {
        Arc::new(Self::new(settings))
    }

    fn classify(
        &self,
        reference: &RgbaImage,
        candidate: &RgbaImage,
        x: u32,
        y: u32,
        mode: SensitivityMode,
        tolerance: &Tolerance,
    ) -> Verdict {
        let p1 = PixelInfo::from_rgba(reference.get_pixel(x, y));
        let p2 = PixelInfo::from_rgba(candidate.get_pixel(x, y));

        let brightness_similar = is_similar(p1.a, p2.a, tolerance.alpha)
            && is_similar(p1.brightness, p2.brightness, tolerance.min_brightness);

        if mode == SensitivityMode::IgnoreColors {
            return if brightness_similar {
                Verdict::SimilarBrightness
            } else {
                Verdict::Mismatch
            };
        }

        let rgb_similar = is_similar(p1.r, p2.r, tolerance.red)
            && is_similar(p1.g, p2.g, tolerance.green)
            && is_similar(p1.b, p2.b, tolerance.blue)
            && is_similar(p1.a, p2.a, tolerance.alpha);

        if rgb_similar {
            return Verdict::Similar;
        }

        if mode == SensitivityMode::IgnoreAntialiasing
            && (is_antialiased(reference, x, y, &p1, tolerance)
                || is_antialiased(candidate, x, y, &p2, tolerance))
        {
            return if brightness_similar {
                Verdict::SimilarBrightness
            } else {
                Verdict::Mismatch
            };
        }

        Verdict::Mismatch
    }
}

/// Whether the pixel at (x, y) sits on an anti-aliased edge of `img`
///
/// Looks at the 8 direct neighbours: several high-contrast or
/// different-hue siblings, or too few identical ones, mark an edge.
fn is_antialiased(img: &RgbaImage, x: u32, y: u32, source: &PixelInfo, tolerance: &Tolerance) -> bool {
    let (width, height) = img.dimensions();
    let mut high_contrast = 0;
    let mut different_hue = 0;
    let mut equivalent = 0;

    for dx in -1i64..=1 {
        for dy in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                continue;
            }

            let target = PixelInfo::from_rgba(img.get_pixel(nx as u32, ny as u32));

            if (source.brightness - target.brightness).abs() > tolerance.max_brightness {
                high_contrast += 1;
            }
            if source.same_rgb(&target) {
                equivalent += 1;
            }
            if (target.hue - source.hue).abs() > HUE_DISTANCE {
                different_hue += 1;
            }

            if different_hue > 1 || high_contrast > 1 {
                return true;
            }
        }
    }

    equivalent < 2
}

impl DiffEngine for PixelDiffEngine {
    fn compare(
        &self,
        reference: &RgbaImage,
        candidate: &RgbaImage,
        mode: SensitivityMode,
        highlight: HighlightColor,
    ) -> Result<DiffResult, String> {
        let (width, height) = reference.dimensions();
        if width == 0 || height == 0 {
            return Err("reference image is empty".to_string());
        }

        let tolerance = Tolerance::for_mode(mode);
        let threshold = self.settings.large_image_threshold;
        let skip = (threshold > 0 && (width > threshold || height > threshold))
            .then_some(LARGE_IMAGE_SKIP);
        let fade = |alpha: u8| (f32::from(alpha) * self.settings.transparency).round() as u8;
        let error_pixel = Rgba([highlight.red, highlight.green, highlight.blue, 255]);

        let mut diff = RgbaImage::new(width, height);
        let mut mismatches: u64 = 0;

        for y in 0..height {
            for x in 0..width {
                if let Some(step) = skip {
                    if x % step == 0 || y % step == 0 {
                        continue;
                    }
                }

                // Pixels the candidate does not cover always mismatch
                if x >= candidate.width() || y >= candidate.height() {
                    diff.put_pixel(x, y, error_pixel);
                    mismatches += 1;
                    continue;
                }

                // Matching pixels show the reference, faded
                let px = *reference.get_pixel(x, y);
                match self.classify(reference, candidate, x, y, mode, &tolerance) {
                    Verdict::Similar => {
                        diff.put_pixel(x, y, Rgba([px[0], px[1], px[2], fade(px[3])]));
                    }
                    Verdict::SimilarBrightness => {
                        let [r, g, b, a] = px.0.map(f32::from);
                        let gray = brightness(r, g, b).round().clamp(0.0, 255.0) as u8;
                        diff.put_pixel(x, y, Rgba([gray, gray, gray, fade(a as u8)]));
                    }
                    Verdict::Mismatch => {
                        diff.put_pixel(x, y, error_pixel);
                        mismatches += 1;
                    }
                }
            }
        }

        let total = u64::from(width) * u64::from(height);
        let percent = mismatches as f64 / total as f64 * 100.0;
        let mismatch_percent = ((percent * 100.0).round() / 100.0).clamp(0.0, 100.0) as f32;

        Ok(DiffResult {
            mismatch_percent,
            diff_image: Some(Arc::new(diff)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(rgba))
    }

    fn engine() -> PixelDiffEngine {
        PixelDiffEngine::default()
    }

    #[test]
    fn test_identical_images_match() {
        let img = solid(4, 4, [40, 80, 120, 255]);
        for mode in SensitivityMode::ALL {
            let result = engine()
                .compare(&img, &img, mode, HighlightColor::MAGENTA)
                .unwrap();
            assert_eq!(result.mismatch_percent, 0.0, "mode {mode}");
        }
    }

    #[test]
    fn test_completely_different_images() {
        let black = solid(3, 3, [0, 0, 0, 255]);
        let white = solid(3, 3, [255, 255, 255, 255]);

        let result = engine()
            .compare(&black, &white, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();

        assert_eq!(result.mismatch_percent, 100.0);
        let diff = result.diff_image.unwrap();
        assert_eq!(diff.get_pixel(1, 1), &Rgba([255, 0, 255, 255]));
    }

    #[test]
    fn test_small_channel_noise_is_tolerated() {
        let a = solid(2, 2, [100, 100, 100, 255]);
        let b = solid(2, 2, [110, 95, 105, 255]);

        let result = engine()
            .compare(&a, &b, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();
        assert_eq!(result.mismatch_percent, 0.0);
    }

    #[test]
    fn test_matching_pixels_fade_reference_into_diff() {
        let reference = solid(2, 2, [100, 100, 100, 255]);
        let candidate = solid(2, 2, [110, 95, 105, 255]);

        let result = engine()
            .compare(&reference, &candidate, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();
        let diff = result.diff_image.unwrap();

        let pixel = diff.get_pixel(0, 0);
        assert_eq!(&pixel.0[..3], &[100, 100, 100]);
        assert_eq!(pixel[3], 77);
    }

    #[test]
    fn test_brightness_match_copies_reference_as_gray() {
        let red = solid(2, 2, [255, 0, 0, 255]);
        let gray = solid(2, 2, [76, 76, 76, 255]);

        let result = engine()
            .compare(&red, &gray, SensitivityMode::IgnoreColors, HighlightColor::MAGENTA)
            .unwrap();
        let diff = result.diff_image.unwrap();

        // 0.3 * 255 of the red reference, not the gray candidate's 76
        assert_eq!(&diff.get_pixel(1, 1).0[..3], &[77, 77, 77]);
    }

    #[test]
    fn test_ignore_colors_compares_brightness_only() {
        // Pure red and a gray of (almost) the same brightness
        let red = solid(2, 2, [255, 0, 0, 255]);
        let gray = solid(2, 2, [76, 76, 76, 255]);

        let exact = engine()
            .compare(&red, &gray, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();
        let colors = engine()
            .compare(&red, &gray, SensitivityMode::IgnoreColors, HighlightColor::MAGENTA)
            .unwrap();

        assert_eq!(exact.mismatch_percent, 100.0);
        assert_eq!(colors.mismatch_percent, 0.0);
    }

    #[test]
    fn test_ignore_antialiasing_forgives_edge_pixels() {
        // 5x5: two black columns then three white ones, one softened edge pixel
        let mut reference = solid(5, 5, [255, 255, 255, 255]);
        for y in 0..5 {
            for x in 0..2 {
                reference.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        let mut candidate = reference.clone();
        candidate.put_pixel(2, 2, Rgba([200, 200, 200, 255]));

        let exact = engine()
            .compare(&reference, &candidate, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();
        let aa = engine()
            .compare(
                &reference,
                &candidate,
                SensitivityMode::IgnoreAntialiasing,
                HighlightColor::MAGENTA,
            )
            .unwrap();

        assert_eq!(exact.mismatch_percent, 4.0);
        assert_eq!(aa.mismatch_percent, 0.0);
    }

    #[test]
    fn test_smaller_candidate_counts_uncovered_pixels() {
        let reference = solid(2, 2, [10, 10, 10, 255]);
        let candidate = solid(1, 2, [10, 10, 10, 255]);

        let result = engine()
            .compare(&reference, &candidate, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();

        assert_eq!(result.mismatch_percent, 50.0);
        assert_eq!(result.diff_image.unwrap().dimensions(), (2, 2));
    }

    #[test]
    fn test_highlight_color_only_affects_image() {
        let a = solid(2, 1, [0, 0, 0, 255]);
        let mut b = a.clone();
        b.put_pixel(0, 0, Rgba([255, 255, 255, 255]));

        let magenta = engine()
            .compare(&a, &b, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();
        let green = engine()
            .compare(&a, &b, SensitivityMode::Exact, HighlightColor::new(0, 255, 0))
            .unwrap();

        assert_eq!(magenta.mismatch_percent, green.mismatch_percent);
        assert_eq!(green.diff_image.unwrap().get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
        // Matching pixel is faded to 30% alpha
        assert_eq!(magenta.diff_image.unwrap().get_pixel(1, 0)[3], 77);
    }

    #[test]
    fn test_repeated_compare_is_deterministic() {
        let mut a = solid(7, 5, [30, 60, 90, 255]);
        a.put_pixel(3, 3, Rgba([250, 10, 10, 255]));
        let b = solid(7, 5, [30, 60, 90, 255]);

        for mode in SensitivityMode::ALL {
            let first = engine().compare(&a, &b, mode, HighlightColor::MAGENTA).unwrap();
            let second = engine().compare(&a, &b, mode, HighlightColor::MAGENTA).unwrap();
            assert_eq!(first.mismatch_percent, second.mismatch_percent);
            assert!((0.0..=100.0).contains(&first.mismatch_percent));
        }
    }

    #[test]
    fn test_large_images_are_sampled() {
        let engine = PixelDiffEngine::new(EngineSettings {
            transparency: 0.3,
            large_image_threshold: 8,
        });
        let black = solid(12, 12, [0, 0, 0, 255]);
        let white = solid(12, 12, [255, 255, 255, 255]);

        let result = engine
            .compare(&black, &white, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .unwrap();

        // Rows and columns 0 and 6 are skipped: 10 x 10 of 144 pixels compared
        assert_eq!(result.mismatch_percent, 69.44);
    }

    #[test]
    fn test_empty_reference_is_an_error() {
        let empty = RgbaImage::new(0, 0);
        let other = solid(1, 1, [0, 0, 0, 255]);
        assert!(engine()
            .compare(&empty, &other, SensitivityMode::Exact, HighlightColor::MAGENTA)
            .is_err());
    }
}
