/// Shared data structures for the comparison session
///
/// These structs represent the data model that flows between
/// the candidate store, the diff adapter and the presentation layer.
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Stable, session-unique identifier of a candidate
///
/// Handed out by a monotonically increasing counter in the store, so two
/// candidates can never share an id even when added in the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub u64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Named configuration of the diff algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SensitivityMode {
    /// Pixel-exact comparison (with the default small tolerance)
    #[default]
    #[serde(rename = "all")]
    Exact,
    /// Compare brightness only
    #[serde(rename = "colors")]
    IgnoreColors,
    /// Forgive anti-aliasing artifacts along edges
    #[serde(rename = "aa")]
    IgnoreAntialiasing,
}

impl SensitivityMode {
    /// Every mode, in the order results are computed and displayed
    pub const ALL: [SensitivityMode; 3] = [
        SensitivityMode::Exact,
        SensitivityMode::IgnoreColors,
        SensitivityMode::IgnoreAntialiasing,
    ];

    /// Short stable key ("all", "colors", "aa")
    pub fn key(self) -> &'static str {
        match self {
            SensitivityMode::Exact => "all",
            SensitivityMode::IgnoreColors => "colors",
            SensitivityMode::IgnoreAntialiasing => "aa",
        }
    }

    /// Human readable name for the settings panel
    pub fn label(self) -> &'static str {
        match self {
            SensitivityMode::Exact => "Exact",
            SensitivityMode::IgnoreColors => "Ignore colors",
            SensitivityMode::IgnoreAntialiasing => "Ignore antialiasing",
        }
    }
}

impl fmt::Display for SensitivityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Color used to paint mismatching pixels in the rendered diff image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl HighlightColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Magenta, the default error color
    pub const MAGENTA: HighlightColor = HighlightColor::new(255, 0, 255);
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::MAGENTA
    }
}

/// Outcome of one (candidate, mode) comparison
///
/// Immutable once produced. Cloning is cheap: the diff image is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    /// Share of mismatching pixels, always within [0, 100]
    pub mismatch_percent: f32,
    /// Rendered diff image, if the engine produced one
    pub diff_image: Option<Arc<RgbaImage>>,
}

impl DiffResult {
    /// Zeroed placeholder used while no reference is loaded
    pub fn placeholder() -> Self {
        Self {
            mismatch_percent: 0.0,
            diff_image: None,
        }
    }
}

/// Cached result for one mode: either a score or the degraded state
#[derive(Debug, Clone, PartialEq)]
pub enum ModeResult {
    Ready(DiffResult),
    /// The diff primitive failed; the score is undefined and sorts last
    Unavailable { reason: String },
}

impl ModeResult {
    pub fn mismatch_percent(&self) -> Option<f32> {
        match self {
            ModeResult::Ready(result) => Some(result.mismatch_percent),
            ModeResult::Unavailable { .. } => None,
        }
    }

    pub fn diff_image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            ModeResult::Ready(result) => result.diff_image.as_ref(),
            ModeResult::Unavailable { .. } => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ModeResult::Unavailable { .. })
    }
}

/// The per-candidate result cache: one slot per sensitivity mode
///
/// Always replaced as a whole, never slot by slot, so readers never see a
/// mix of old and new mode results for the same candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeResults {
    pub exact: ModeResult,
    pub ignore_colors: ModeResult,
    pub ignore_antialiasing: ModeResult,
}

impl ModeResults {
    pub fn placeholders() -> Self {
        Self {
            exact: ModeResult::Ready(DiffResult::placeholder()),
            ignore_colors: ModeResult::Ready(DiffResult::placeholder()),
            ignore_antialiasing: ModeResult::Ready(DiffResult::placeholder()),
        }
    }

    pub fn get(&self, mode: SensitivityMode) -> &ModeResult {
        match mode {
            SensitivityMode::Exact => &self.exact,
            SensitivityMode::IgnoreColors => &self.ignore_colors,
            SensitivityMode::IgnoreAntialiasing => &self.ignore_antialiasing,
        }
    }

    /// True if any mode failed to compute
    pub fn is_degraded(&self) -> bool {
        SensitivityMode::ALL
            .iter()
            .any(|&mode| self.get(mode).is_unavailable())
    }
}

/// The image every candidate is compared against
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    /// File name only (e.g., "ref.png")
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Decoded pixels, shared with in-flight comparison jobs
    pub image: Arc<RgbaImage>,
}

impl ReferenceImage {
    pub fn new(name: impl Into<String>, image: Arc<RgbaImage>) -> Self {
        Self {
            name: name.into(),
            width: image.width(),
            height: image.height(),
            image,
        }
    }

    /// Name with dimensions, e.g. "ref.png (800x600)"
    pub fn summary(&self) -> String {
        format!("{} ({}x{})", self.name, self.width, self.height)
    }
}

/// Token identifying one issued comparison job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(pub u64);

/// The single job whose result a candidate will accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub ticket: Ticket,
    /// Whether the job belongs to a batch that freezes the ranking
    pub tracked: bool,
}

/// A single candidate image in the store
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    /// File name only (e.g., "shot_02.png")
    pub name: String,
    /// Decoded pixels, shared with in-flight comparison jobs
    pub image: Arc<RgbaImage>,
    pub results: ModeResults,
    /// False until the first result set (or placeholder) is committed
    pub committed: bool,
    pub pending: Option<Pending>,
}

impl Candidate {
    pub fn score(&self, mode: SensitivityMode) -> Option<f32> {
        self.results.get(mode).mismatch_percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_keys_match_serde_names() {
        for mode in SensitivityMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.key()));
        }
    }

    #[test]
    fn test_degraded_when_any_mode_unavailable() {
        let mut results = ModeResults::placeholders();
        assert!(!results.is_degraded());

        results.ignore_colors = ModeResult::Unavailable {
            reason: "boom".to_string(),
        };
        assert!(results.is_degraded());
        assert_eq!(results.get(SensitivityMode::IgnoreColors).mismatch_percent(), None);
        assert_eq!(results.get(SensitivityMode::Exact).mismatch_percent(), Some(0.0));
    }

    #[test]
    fn test_reference_summary() {
        let reference = ReferenceImage::new("ref.png", Arc::new(RgbaImage::new(800, 600)));
        assert_eq!(reference.summary(), "ref.png (800x600)");
    }
}
