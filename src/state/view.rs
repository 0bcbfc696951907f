//! Interaction state machine of the comparison area
//!
//! Two dimensions:
//! - a persistent view mode (slider wipe or full diff), chosen explicitly
//! - a momentary reveal override driven by hovering and holding a single
//!   control
//!
//! Inputs are abstract pointer events, so the machine knows nothing about
//! the widget toolkit that produces them.

use serde::{Deserialize, Serialize};

/// Persistent view mode
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Candidate on the left of a draggable divider, reference on the right
    #[default]
    SliderWipe,
    /// Diff image over the candidate
    FullDiff,
}

/// Momentary override of the resting visual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reveal {
    #[default]
    None,
    /// Hovering the control: candidate fully visible
    Candidate,
    /// Holding the control: reference fully visible
    Base,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Abstract input events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    /// Pointer entered the reveal control
    EnterReveal,
    /// Pointer left the reveal control
    LeaveReveal,
    /// Button pressed over the reveal control
    Press(PointerButton),
    /// Button released anywhere
    Release,
    /// Pointer moved over the comparison area, as a share of its width
    Move { percent: f32 },
    /// Explicit view mode choice
    SelectMode(ViewMode),
}

/// What an input did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Ignored,
    /// Only the wipe position moved; labels stay as they are
    WipeMoved,
    /// Mode or reveal changed; labels must be recomputed
    Changed,
}

/// How each layer of the comparison area is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    /// Share of the width (from the left) where the candidate is visible
    pub candidate_clip: f32,
    pub candidate_opacity: f32,
    pub diff_opacity: f32,
    /// Divider position, when the divider is shown
    pub divider: Option<f32>,
}

/// The state machine itself
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    mode: ViewMode,
    /// Last position set by the pointer; survives candidate switches
    wipe_percent: f32,
    hovering: bool,
    holding: bool,
}

impl Interaction {
    pub fn new(mode: ViewMode, wipe_percent: f32) -> Self {
        Self {
            mode,
            wipe_percent: wipe_percent.clamp(0.0, 100.0),
            hovering: false,
            holding: false,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn wipe_percent(&self) -> f32 {
        self.wipe_percent
    }

    /// Holding wins over hovering
    pub fn reveal(&self) -> Reveal {
        if self.holding {
            Reveal::Base
        } else if self.hovering {
            Reveal::Candidate
        } else {
            Reveal::None
        }
    }

    /// Drop any reveal override (on selection, mode or sensitivity change)
    pub fn reset_reveal(&mut self) {
        self.hovering = false;
        self.holding = false;
    }

    pub fn handle(&mut self, input: Input) -> Transition {
        let before = self.reveal();

        match input {
            Input::EnterReveal => self.hovering = true,
            Input::LeaveReveal => self.hovering = false,
            Input::Press(PointerButton::Primary) => {
                if self.hovering {
                    self.holding = true;
                }
            }
            Input::Press(_) => return Transition::Ignored,
            Input::Release => self.holding = false,
            Input::Move { percent } => return self.move_wipe(percent),
            Input::SelectMode(mode) => {
                self.mode = mode;
                self.reset_reveal();
                return Transition::Changed;
            }
        }

        if self.reveal() == before {
            Transition::Ignored
        } else {
            Transition::Changed
        }
    }

    fn move_wipe(&mut self, percent: f32) -> Transition {
        if self.mode != ViewMode::SliderWipe || self.reveal() != Reveal::None || percent.is_nan() {
            return Transition::Ignored;
        }
        self.wipe_percent = percent.clamp(0.0, 100.0);
        Transition::WipeMoved
    }

    /// Decide how the layers are drawn
    ///
    /// `has_diff` tells whether the current candidate has a diff image in
    /// the active mode; full diff mode without one rests as a slider wipe.
    pub fn visual(&self, has_diff: bool) -> Visual {
        let resting_wipe = Visual {
            candidate_clip: self.wipe_percent,
            candidate_opacity: 1.0,
            diff_opacity: 0.0,
            divider: Some(self.wipe_percent),
        };

        match (self.mode, self.reveal()) {
            (ViewMode::SliderWipe, Reveal::None) => resting_wipe,
            (ViewMode::FullDiff, Reveal::None) if !has_diff => resting_wipe,
            (ViewMode::FullDiff, Reveal::None) => Visual {
                candidate_clip: 100.0,
                candidate_opacity: 1.0,
                diff_opacity: 1.0,
                divider: None,
            },
            (ViewMode::SliderWipe, Reveal::Candidate) | (ViewMode::FullDiff, Reveal::Candidate) => {
                Visual {
                    candidate_clip: 100.0,
                    candidate_opacity: 1.0,
                    diff_opacity: 0.0,
                    divider: None,
                }
            }
            (ViewMode::SliderWipe, Reveal::Base) => Visual {
                candidate_clip: 0.0,
                candidate_opacity: 1.0,
                diff_opacity: 0.0,
                divider: None,
            },
            (ViewMode::FullDiff, Reveal::Base) => Visual {
                candidate_clip: 100.0,
                candidate_opacity: 0.0,
                diff_opacity: 0.0,
                divider: None,
            },
        }
    }

    /// Left and right edge label text for the current state
    pub fn labels(&self, candidate: &str, reference: &str) -> (String, String) {
        let (left, right) = match (self.reveal(), self.mode) {
            (Reveal::Candidate, _) => (candidate, ""),
            (Reveal::Base, _) => ("", reference),
            (Reveal::None, ViewMode::SliderWipe) => (candidate, reference),
            (Reveal::None, ViewMode::FullDiff) => (candidate, ""),
        };
        (left.to_string(), right.to_string())
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new(ViewMode::SliderWipe, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_press_release_leave() {
        let mut view = Interaction::default();

        assert_eq!(view.handle(Input::EnterReveal), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::Candidate);

        assert_eq!(view.handle(Input::Press(PointerButton::Primary)), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::Base);

        // Releasing while still inside goes back to the hover reveal
        assert_eq!(view.handle(Input::Release), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::Candidate);

        assert_eq!(view.handle(Input::LeaveReveal), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::None);
    }

    #[test]
    fn test_leaving_while_holding_keeps_base_until_release() {
        let mut view = Interaction::default();
        view.handle(Input::EnterReveal);
        view.handle(Input::Press(PointerButton::Primary));

        assert_eq!(view.handle(Input::LeaveReveal), Transition::Ignored);
        assert_eq!(view.reveal(), Reveal::Base);

        assert_eq!(view.handle(Input::Release), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::None);
    }

    #[test]
    fn test_only_primary_press_over_control_holds() {
        let mut view = Interaction::default();

        // Not hovering: press is not on the control
        assert_eq!(view.handle(Input::Press(PointerButton::Primary)), Transition::Ignored);
        assert_eq!(view.reveal(), Reveal::None);

        view.handle(Input::EnterReveal);
        assert_eq!(view.handle(Input::Press(PointerButton::Secondary)), Transition::Ignored);
        assert_eq!(view.reveal(), Reveal::Candidate);
    }

    #[test]
    fn test_move_updates_wipe_only_when_resting_in_slider() {
        let mut view = Interaction::default();

        assert_eq!(view.handle(Input::Move { percent: 30.0 }), Transition::WipeMoved);
        assert_eq!(view.wipe_percent(), 30.0);

        assert_eq!(view.handle(Input::Move { percent: 140.0 }), Transition::WipeMoved);
        assert_eq!(view.wipe_percent(), 100.0);
        view.handle(Input::Move { percent: -5.0 });
        assert_eq!(view.wipe_percent(), 0.0);

        view.handle(Input::EnterReveal);
        assert_eq!(view.handle(Input::Move { percent: 70.0 }), Transition::Ignored);
        view.handle(Input::LeaveReveal);
        assert_eq!(view.wipe_percent(), 0.0);

        view.handle(Input::SelectMode(ViewMode::FullDiff));
        assert_eq!(view.handle(Input::Move { percent: 70.0 }), Transition::Ignored);
        assert_eq!(view.wipe_percent(), 0.0);
    }

    #[test]
    fn test_mode_select_resets_reveal_and_keeps_wipe() {
        let mut view = Interaction::default();
        view.handle(Input::Move { percent: 20.0 });
        view.handle(Input::EnterReveal);

        assert_eq!(view.handle(Input::SelectMode(ViewMode::FullDiff)), Transition::Changed);
        assert_eq!(view.reveal(), Reveal::None);

        view.handle(Input::SelectMode(ViewMode::SliderWipe));
        assert_eq!(view.visual(true).divider, Some(20.0));
    }

    #[test]
    fn test_visuals_per_state() {
        let mut view = Interaction::new(ViewMode::SliderWipe, 40.0);
        assert_eq!(
            view.visual(true),
            Visual { candidate_clip: 40.0, candidate_opacity: 1.0, diff_opacity: 0.0, divider: Some(40.0) }
        );

        view.handle(Input::EnterReveal);
        assert_eq!(view.visual(true).candidate_clip, 100.0);
        assert_eq!(view.visual(true).divider, None);

        view.handle(Input::Press(PointerButton::Primary));
        assert_eq!(view.visual(true).candidate_clip, 0.0);

        let mut diff = Interaction::new(ViewMode::FullDiff, 40.0);
        assert_eq!(diff.visual(true).diff_opacity, 1.0);
        assert_eq!(diff.visual(false), Interaction::new(ViewMode::SliderWipe, 40.0).visual(false));

        diff.handle(Input::EnterReveal);
        assert_eq!(diff.visual(true).diff_opacity, 0.0);
        assert_eq!(diff.visual(true).candidate_opacity, 1.0);

        diff.handle(Input::Press(PointerButton::Primary));
        assert_eq!(diff.visual(true).candidate_opacity, 0.0);
        assert_eq!(diff.visual(true).diff_opacity, 0.0);
    }

    #[test]
    fn test_labels_per_state() {
        let mut view = Interaction::default();
        assert_eq!(view.labels("cand.png", "ref.png"), ("cand.png".into(), "ref.png".into()));

        view.handle(Input::EnterReveal);
        assert_eq!(view.labels("cand.png", "ref.png"), ("cand.png".into(), String::new()));

        view.handle(Input::Press(PointerButton::Primary));
        assert_eq!(view.labels("cand.png", "ref.png"), (String::new(), "ref.png".into()));

        let diff = Interaction::new(ViewMode::FullDiff, 50.0);
        assert_eq!(diff.labels("cand.png", "ref.png"), ("cand.png".into(), String::new()));
    }
}
