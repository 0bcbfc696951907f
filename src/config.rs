//! User settings for the comparison session
//!
//! Settings are read once at startup from a JSON file and never written
//! back. Missing fields fall back to their defaults, so a settings file
//! only needs the values it wants to change.
//!
//! Lookup order:
//! - `$COMPARE_VIEW_CONFIG` if set
//! - `<config dir>/compare-view/settings.json`
//!   (e.g. `~/.config/compare-view/settings.json` on Linux)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CompareError, Result};
use crate::state::data::{HighlightColor, SensitivityMode};
use crate::state::view::ViewMode;

/// Environment variable pointing at an explicit settings file
pub const CONFIG_ENV: &str = "COMPARE_VIEW_CONFIG";

/// Which candidates are recomputed when the highlight color changes
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightScope {
    /// Only the current selection. Other cached diff images keep the old
    /// color until they are recomputed for another reason.
    #[default]
    Current,
    /// Every candidate, so the whole list shares one color
    All,
}

/// All tunables of a session
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    // ========== Diff ==========

    /// Initial error highlight color
    pub highlight: HighlightColor,

    /// Colors offered as swatches in the settings panel
    pub swatches: Vec<HighlightColor>,

    /// Alpha multiplier applied to matching pixels in the diff image (0.0 to 1.0)
    pub diff_transparency: f32,

    /// Images wider or taller than this are sampled instead of fully analysed.
    /// 0 disables sampling.
    pub large_image_threshold: u32,

    /// Recomputation scope on highlight change
    pub highlight_scope: HighlightScope,

    // ========== View ==========

    /// Sensitivity mode active at startup
    pub default_sensitivity: SensitivityMode,

    /// View mode active at startup
    pub default_view_mode: ViewMode,

    /// Wipe position before the pointer first moves (0.0 to 100.0)
    pub initial_wipe_percent: f32,

    /// Delay before edge labels fade out
    pub label_hide_delay_ms: u64,

    /// Delay before a finished status message disappears
    pub status_hide_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            highlight: HighlightColor::MAGENTA,
            swatches: vec![
                HighlightColor::MAGENTA,
                HighlightColor::new(255, 0, 0),
                HighlightColor::new(0, 255, 0),
                HighlightColor::new(0, 128, 255),
                HighlightColor::new(255, 255, 0),
                HighlightColor::new(0, 255, 255),
            ],
            diff_transparency: 0.3,
            large_image_threshold: 1200,
            highlight_scope: HighlightScope::Current,
            default_sensitivity: SensitivityMode::Exact,
            default_view_mode: ViewMode::SliderWipe,
            initial_wipe_percent: 50.0,
            label_hide_delay_ms: 2000,
            status_hide_delay_ms: 3000,
        }
    }
}

impl Settings {
    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Read settings from the default location, falling back to defaults
    ///
    /// A missing file is normal. A broken file is logged and ignored so a
    /// typo never keeps the application from starting.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings: {}", e);
                Self::default()
            }
        }
    }

    /// Get the path where the settings file is looked up
    pub fn config_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }

        let mut path = dirs::config_dir()?;
        path.push("compare-view");
        path.push("settings.json");
        Some(path)
    }

    pub fn label_hide_delay(&self) -> Duration {
        Duration::from_millis(self.label_hide_delay_ms)
    }

    pub fn status_hide_delay(&self) -> Duration {
        Duration::from_millis(self.status_hide_delay_ms)
    }

    /// Clamp out-of-range values into their valid ranges
    fn sanitized(mut self) -> Self {
        self.diff_transparency = self.diff_transparency.clamp(0.0, 1.0);
        self.initial_wipe_percent = self.initial_wipe_percent.clamp(0.0, 100.0);
        if self.swatches.is_empty() {
            self.swatches = Settings::default().swatches;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "highlight_scope": "all" }"#).unwrap();

        assert_eq!(settings.highlight_scope, HighlightScope::All);
        assert_eq!(settings.highlight, HighlightColor::MAGENTA);
        assert_eq!(settings.label_hide_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_serialization() {
        let mut settings = Settings::default();
        settings.default_sensitivity = SensitivityMode::IgnoreAntialiasing;
        settings.highlight = HighlightColor::new(0, 255, 0);

        let json = settings.to_json().unwrap();
        let restored = Settings::from_json(&json).unwrap();

        assert_eq!(settings, restored);
        assert!(json.contains("\"aa\""));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let settings = Settings::from_json(
            r#"{ "diff_transparency": 4.0, "initial_wipe_percent": -10.0, "swatches": [] }"#,
        )
        .unwrap();

        assert_eq!(settings.diff_transparency, 1.0);
        assert_eq!(settings.initial_wipe_percent, 0.0);
        assert!(!settings.swatches.is_empty());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CompareError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load_from(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, CompareError::Io { .. }));
    }
}
