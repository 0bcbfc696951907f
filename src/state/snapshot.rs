//! Read-only view of a session for the presentation layer
//!
//! Rebuilt after every state change. Images are shared, not copied.

use std::sync::Arc;

use image::RgbaImage;

use super::data::{CandidateId, HighlightColor, SensitivityMode};
use super::labels::Labels;
use super::store::Progress;
use super::view::{Reveal, ViewMode, Visual};

/// One row of the ranked candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: CandidateId,
    pub name: String,
    /// Score in the active mode; `None` if it could not be computed
    pub score: Option<f32>,
    pub selected: bool,
    /// At least one mode failed for this candidate
    pub degraded: bool,
}

impl ListEntry {
    /// Score with two decimals, e.g. "12.50%"
    pub fn score_label(&self) -> String {
        match self.score {
            Some(score) => format!("{:.2}%", score),
            None => "n/a".to_string(),
        }
    }
}

/// Everything needed to draw the comparison area
#[derive(Debug, Clone)]
pub struct CurrentView {
    pub id: CandidateId,
    pub name: String,
    pub reference: Arc<RgbaImage>,
    pub candidate: Arc<RgbaImage>,
    /// Diff image of the active mode, if any
    pub diff: Option<Arc<RgbaImage>>,
    pub visual: Visual,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view_mode: ViewMode,
    pub wipe_percent: f32,
    pub reveal: Reveal,
    pub sensitivity: SensitivityMode,
    pub highlight: HighlightColor,
    /// Reference name with dimensions, e.g. "ref.png (800x600)"
    pub reference: Option<String>,
    /// Ranked list, best match first
    pub entries: Vec<ListEntry>,
    /// `None` in the empty state (no reference or nothing selected)
    pub current: Option<CurrentView>,
    pub labels: Labels,
    pub status: Option<String>,
    pub progress: Option<Progress>,
}

impl Snapshot {
    /// List header, e.g. "3 items"
    pub fn count_label(&self) -> String {
        format!("{} items", self.entries.len())
    }
}
