//! The single owned state container of a comparison session
//!
//! `Session` ties the candidate store, the interaction state machine, the
//! edge labels and the status line together. It is mutated only through
//! its operations; each returns [`Effects`] describing the async work the
//! caller must schedule, and [`Session::snapshot`] gives the presentation
//! layer an immutable view.

use super::data::{CandidateId, HighlightColor, SensitivityMode};
use super::job::{ComparisonJob, JobOutcome};
use super::labels::{HideTicket, HideTimer, LabelState, Labels};
use super::snapshot::{CurrentView, ListEntry, Snapshot};
use super::store::{CandidateStore, Commit};
use super::view::{Input, Interaction, Reveal, Transition};
use crate::config::Settings;
use crate::error::CompareError;
use crate::loader::LoadedImage;

/// Async work requested by a session operation
#[derive(Debug, Default)]
pub struct Effects {
    /// Comparisons to run; feed each outcome to [`Session::complete`]
    pub jobs: Vec<ComparisonJob>,
    /// Call [`Session::labels_expired`] with this after the label delay
    pub hide_labels: Option<HideTicket>,
    /// Call [`Session::status_expired`] with this after the status delay
    pub hide_status: Option<HideTicket>,
}

impl Effects {
    fn with_jobs(jobs: Vec<ComparisonJob>) -> Self {
        Self {
            jobs,
            ..Self::default()
        }
    }

    fn with_labels(hide_labels: Option<HideTicket>) -> Self {
        Self {
            hide_labels,
            ..Self::default()
        }
    }
}

pub struct Session {
    settings: Settings,
    store: CandidateStore,
    interaction: Interaction,
    labels: LabelState,
    status: Option<String>,
    status_timer: HideTimer,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            store: CandidateStore::new(&settings),
            interaction: Interaction::new(settings.default_view_mode, settings.initial_wipe_percent),
            labels: LabelState::default(),
            status: None,
            status_timer: HideTimer::default(),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn labels(&self) -> &Labels {
        self.labels.labels()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // ========== Store operations ==========

    /// Load a new reference; recomputes every existing candidate
    pub fn set_reference(&mut self, image: LoadedImage) -> Effects {
        let jobs = self.store.set_reference(image.into_reference());
        if let Some(progress) = self.store.progress() {
            self.set_status(progress.message());
        }

        let mut effects = Effects::with_jobs(jobs);
        effects.hide_labels = self.flash_labels();
        effects
    }

    /// Add a batch of decoded candidates
    pub fn add_candidates(&mut self, images: Vec<LoadedImage>) -> Effects {
        if images.is_empty() {
            return Effects::default();
        }

        let before = self.store.selection();
        self.set_status(format!("Processing {} new files...", images.len()));

        let jobs: Vec<ComparisonJob> = images
            .into_iter()
            .filter_map(|image| self.store.add_candidate(image.name, image.image).1)
            .collect();

        let mut effects = self.after_selection_change(before);
        if !self.store.is_settling() {
            effects.hide_status = self.finish_status("Done.");
        }
        effects.jobs = jobs;
        effects
    }

    /// Report a file that could not be loaded; the rest of the batch goes on
    pub fn reject(&mut self, name: &str, error: &CompareError) -> Effects {
        log::warn!("Skipping {}: {}", name, error);
        self.status = Some(format!("Skipped {}: {}", name, error));

        if self.store.is_settling() {
            return Effects::default();
        }
        Effects {
            hide_status: Some(self.status_timer.arm()),
            ..Effects::default()
        }
    }

    /// Commit a finished comparison job
    pub fn complete(&mut self, outcome: JobOutcome) -> Effects {
        let before = self.store.selection();
        let id = outcome.candidate;

        let settled = match self.store.complete(outcome) {
            Commit::Stale => return Effects::default(),
            Commit::Applied { settled } => settled,
        };

        // Results only become visible once the batch they belong to settles
        let visible = settled || (!self.store.is_settling() && self.store.selection() == Some(id));

        let mut effects = if self.store.selection() != before {
            self.after_selection_change(before)
        } else if visible && self.store.selection().is_some() {
            Effects::with_labels(self.flash_labels())
        } else {
            Effects::default()
        };

        if settled {
            effects.hide_status = self.finish_status("Done.");
        } else if let Some(progress) = self.store.progress() {
            self.set_status(progress.message());
        }
        effects
    }

    /// Delete a candidate; unknown ids are ignored
    pub fn remove(&mut self, id: CandidateId) -> Effects {
        let before = self.store.selection();
        let was_settling = self.store.is_settling();

        if let Err(e) = self.store.remove_candidate(id) {
            log::debug!("{}", e);
            return Effects::default();
        }

        let mut effects = self.after_selection_change(before);
        if was_settling && !self.store.is_settling() {
            effects.hide_status = self.finish_status("Done.");
        }
        effects
    }

    /// Make a listed candidate current; unknown ids are ignored
    pub fn select(&mut self, id: CandidateId) -> Effects {
        if let Err(e) = self.store.select(id) {
            log::debug!("{}", e);
            return Effects::default();
        }
        self.interaction.reset_reveal();
        Effects::with_labels(self.flash_labels())
    }

    /// Change the active sensitivity mode (re-sort only)
    pub fn set_sensitivity(&mut self, mode: SensitivityMode) -> Effects {
        self.store.set_active_mode(mode);
        self.interaction.reset_reveal();
        Effects::with_labels(self.flash_labels())
    }

    /// Change the highlight color
    pub fn set_highlight(&mut self, color: HighlightColor) -> Effects {
        Effects::with_jobs(self.store.set_highlight(color))
    }

    // ========== Interaction ==========

    /// Feed a pointer or mode input to the state machine
    pub fn pointer(&mut self, input: Input) -> Effects {
        match self.interaction.handle(input) {
            Transition::Changed => Effects::with_labels(self.flash_labels()),
            Transition::WipeMoved | Transition::Ignored => Effects::default(),
        }
    }

    pub fn labels_expired(&mut self, ticket: HideTicket) {
        self.labels.expire(ticket);
    }

    pub fn status_expired(&mut self, ticket: HideTicket) {
        if self.status_timer.fire(ticket) {
            self.status = None;
        }
    }

    // ========== Snapshot ==========

    pub fn snapshot(&self) -> Snapshot {
        let mode = self.store.active_mode();
        let selection = self.store.selection();

        // Listed results lag behind the candidates while a batch runs
        let entries = self
            .store
            .ranking()
            .iter()
            .filter_map(|&id| Some((self.store.candidate(id)?, self.store.listed_results(id)?)))
            .map(|(candidate, results)| ListEntry {
                id: candidate.id,
                name: candidate.name.clone(),
                score: results.get(mode).mismatch_percent(),
                selected: selection == Some(candidate.id),
                degraded: results.is_degraded(),
            })
            .collect();

        let current = self
            .store
            .listed_reference()
            .zip(self.store.current())
            .map(|(reference, candidate)| {
                let diff = self
                    .store
                    .listed_results(candidate.id)
                    .and_then(|results| results.get(mode).diff_image().cloned());
                CurrentView {
                    id: candidate.id,
                    name: candidate.name.clone(),
                    reference: reference.image.clone(),
                    candidate: candidate.image.clone(),
                    visual: self.interaction.visual(diff.is_some()),
                    diff,
                }
            });

        Snapshot {
            view_mode: self.interaction.mode(),
            wipe_percent: self.interaction.wipe_percent(),
            reveal: self.interaction.reveal(),
            sensitivity: mode,
            highlight: self.store.highlight(),
            reference: self.store.reference().map(|r| r.summary()),
            entries,
            current,
            labels: self.labels.labels().clone(),
            status: self.status.clone(),
            progress: self.store.progress(),
        }
    }

    // ========== Internals ==========

    fn after_selection_change(&mut self, before: Option<CandidateId>) -> Effects {
        if self.store.selection() == before {
            return Effects::default();
        }
        self.interaction.reset_reveal();
        Effects::with_labels(self.flash_labels())
    }

    /// Recompute the edge labels and restart the auto-hide
    fn flash_labels(&mut self) -> Option<HideTicket> {
        let names = self
            .store
            .listed_reference()
            .zip(self.store.current())
            .map(|(reference, candidate)| (candidate.name.clone(), reference.name.clone()));

        let Some((candidate, reference)) = names else {
            self.labels.suppress();
            return None;
        };

        let (left, right) = self.interaction.labels(&candidate, &reference);
        let auto_hide = self.interaction.reveal() == Reveal::None;
        self.labels.show(left, right, auto_hide)
    }

    fn set_status(&mut self, message: String) {
        self.status = Some(message);
        self.status_timer.cancel();
    }

    fn finish_status(&mut self, message: &str) -> Option<HideTicket> {
        self.status = Some(message.to_string());
        Some(self.status_timer.arm())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("interaction", &self.interaction)
            .field("status", &self.status)
            .finish()
    }
}
