use std::sync::Arc;

use image::RgbaImage;

use super::data::{
    Candidate, CandidateId, HighlightColor, ModeResults, Pending, ReferenceImage, SensitivityMode,
    Ticket,
};
use super::job::{ComparisonJob, JobKind, JobOutcome};
use super::ranking;
use crate::config::{HighlightScope, Settings};
use crate::error::{CompareError, Result};

/// Running count of a batch that freezes the ranking until it settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub kind: JobKind,
    pub done: usize,
    pub total: usize,
}

impl Progress {
    /// Status line text, e.g. "Processing 2/5..."
    pub fn message(&self) -> String {
        let verb = match self.kind {
            JobKind::Ingest => "Processing",
            JobKind::Recalculate | JobKind::Recolor => "Recalculating",
        };
        format!("{} {}/{}...", verb, self.done, self.total)
    }
}

/// What the list showed when a batch started
///
/// Held until the batch settles so the list and the comparison area never
/// mix results of different references or half-finished batches.
#[derive(Debug, Clone)]
struct Published {
    reference: Option<ReferenceImage>,
    /// Listed candidates in insertion order
    results: Vec<(CandidateId, ModeResults)>,
}

/// What [`CandidateStore::complete`] did with an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Results replaced the candidate's cache
    Applied {
        /// This commit finished the running batch
        settled: bool,
    },
    /// Superseded reference, superseded job, or removed candidate
    Stale,
}

/// The CandidateStore owns the reference, the candidates and their cached
/// results, plus the derived ranking and the current selection.
///
/// Every mutation is synchronous. Comparisons happen outside the store:
/// operations hand back [`ComparisonJob`]s, and their outcomes come back
/// through [`CandidateStore::complete`].
pub struct CandidateStore {
    /// Candidates in insertion order
    candidates: Vec<Candidate>,
    reference: Option<ReferenceImage>,
    /// Bumped on every reference change
    epoch: u64,
    highlight: HighlightColor,
    highlight_scope: HighlightScope,
    active_mode: SensitivityMode,
    /// Derived order of committed candidates
    ranking: Vec<CandidateId>,
    selection: Option<CandidateId>,
    next_id: u64,
    next_ticket: u64,
    progress: Option<Progress>,
    /// Present exactly while `progress` is
    published: Option<Published>,
}

impl CandidateStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            candidates: Vec::new(),
            reference: None,
            epoch: 0,
            highlight: settings.highlight,
            highlight_scope: settings.highlight_scope,
            active_mode: settings.default_sensitivity,
            ranking: Vec::new(),
            selection: None,
            next_id: 1,
            next_ticket: 1,
            progress: None,
            published: None,
        }
    }

    // ========== Accessors ==========

    pub fn reference(&self) -> Option<&ReferenceImage> {
        self.reference.as_ref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Committed candidates, best match first
    pub fn ranking(&self) -> &[CandidateId] {
        &self.ranking
    }

    pub fn selection(&self) -> Option<CandidateId> {
        self.selection
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.selection.and_then(|id| self.candidate(id))
    }

    pub fn active_mode(&self) -> SensitivityMode {
        self.active_mode
    }

    pub fn highlight(&self) -> HighlightColor {
        self.highlight
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn progress(&self) -> Option<Progress> {
        self.progress
    }

    /// True while a tracked batch is in flight and the ranking is frozen
    pub fn is_settling(&self) -> bool {
        self.progress.is_some()
    }

    /// Reference the listed results were computed against
    ///
    /// Differs from [`CandidateStore::reference`] while a reference change
    /// is being recomputed.
    pub fn listed_reference(&self) -> Option<&ReferenceImage> {
        match &self.published {
            Some(published) => published.reference.as_ref(),
            None => self.reference.as_ref(),
        }
    }

    /// Results to show for a listed candidate
    pub fn listed_results(&self, id: CandidateId) -> Option<&ModeResults> {
        match &self.published {
            Some(published) => published
                .results
                .iter()
                .find(|(listed, _)| *listed == id)
                .map(|(_, results)| results),
            None => self.candidate(id).map(|c| &c.results),
        }
    }

    // ========== Operations ==========

    /// Replace the reference image
    ///
    /// Acts as a barrier: every candidate, including ones whose first
    /// computation is still in flight, gets a new job under the new epoch.
    /// Results of the old epoch are dropped when they arrive.
    pub fn set_reference(&mut self, reference: ReferenceImage) -> Vec<ComparisonJob> {
        self.epoch += 1;
        log::info!(
            "Reference set to {} (epoch {})",
            reference.summary(),
            self.epoch
        );
        let previous = self.reference.replace(reference);

        if self.candidates.is_empty() {
            return Vec::new();
        }
        self.freeze(previous);
        self.recompute_all()
    }

    /// Recompute every candidate in every mode against the current reference
    ///
    /// The ranking stays frozen until the last job is committed.
    pub fn recompute_all(&mut self) -> Vec<ComparisonJob> {
        if self.reference.is_none() || self.candidates.is_empty() {
            return Vec::new();
        }
        self.freeze(self.reference.clone());

        let jobs: Vec<ComparisonJob> = (0..self.candidates.len())
            .filter_map(|index| self.issue(index, JobKind::Recalculate, true))
            .collect();

        self.progress = Some(Progress {
            kind: JobKind::Recalculate,
            done: 0,
            total: jobs.len(),
        });
        log::info!("Recalculating {} candidates", jobs.len());

        jobs
    }

    /// Add a candidate
    ///
    /// Without a reference the candidate is listed immediately with zeroed
    /// placeholder results. Otherwise it stays unlisted until its first
    /// result set is committed.
    pub fn add_candidate(
        &mut self,
        name: impl Into<String>,
        image: Arc<RgbaImage>,
    ) -> (CandidateId, Option<ComparisonJob>) {
        let id = CandidateId(self.next_id);
        self.next_id += 1;

        let has_reference = self.reference.is_some();
        self.candidates.push(Candidate {
            id,
            name: name.into(),
            image,
            results: ModeResults::placeholders(),
            committed: !has_reference,
            pending: None,
        });

        if !has_reference {
            log::debug!("Added {} with placeholder results (no reference yet)", id);
            self.resort();
            return (id, None);
        }

        self.freeze(self.reference.clone());
        let index = self.candidates.len() - 1;
        let job = self.issue(index, JobKind::Ingest, true);
        self.progress
            .get_or_insert(Progress {
                kind: JobKind::Ingest,
                done: 0,
                total: 0,
            })
            .total += 1;

        (id, job)
    }

    /// Commit a finished job, or drop it if it is stale
    pub fn complete(&mut self, outcome: JobOutcome) -> Commit {
        if outcome.epoch != self.epoch {
            log::debug!(
                "Dropping result for {} from superseded epoch {}",
                outcome.candidate,
                outcome.epoch
            );
            return Commit::Stale;
        }

        let Some(candidate) = self.candidates.iter_mut().find(|c| c.id == outcome.candidate) else {
            log::debug!("Dropping result for removed candidate {}", outcome.candidate);
            return Commit::Stale;
        };

        let pending = match candidate.pending {
            Some(pending) if pending.ticket == outcome.ticket => pending,
            _ => {
                log::debug!("Dropping superseded result for {}", outcome.candidate);
                return Commit::Stale;
            }
        };

        if outcome.results.is_degraded() {
            log::warn!("{} has modes that could not be computed", candidate.name);
        }
        candidate.results = outcome.results;
        candidate.committed = true;
        candidate.pending = None;

        let settled = pending.tracked && self.count_done();
        self.resort();

        Commit::Applied { settled }
    }

    /// Remove a candidate; selection falls back to an adjacent entry
    pub fn remove_candidate(&mut self, id: CandidateId) -> Result<()> {
        let index = self
            .candidates
            .iter()
            .position(|c| c.id == id)
            .ok_or(CompareError::InvalidSelection(id))?;

        if self.selection == Some(id) {
            self.selection = ranking::fallback_selection(&self.ranking, id);
        }

        let removed = self.candidates.remove(index);
        self.ranking.retain(|&listed| listed != id);
        if let Some(published) = &mut self.published {
            published.results.retain(|(listed, _)| *listed != id);
        }
        log::info!("Removed {}", removed.name);

        if removed.pending.is_some_and(|p| p.tracked) {
            self.count_dropped();
        }
        self.resort();

        Ok(())
    }

    /// Make a listed candidate the current one
    pub fn select(&mut self, id: CandidateId) -> Result<()> {
        if !self.ranking.contains(&id) {
            return Err(CompareError::InvalidSelection(id));
        }
        self.selection = Some(id);
        Ok(())
    }

    /// Switch the active sensitivity mode; never recomputes anything
    pub fn set_active_mode(&mut self, mode: SensitivityMode) {
        self.active_mode = mode;
        self.resort();
    }

    /// Change the highlight color and recompute per [`HighlightScope`]
    pub fn set_highlight(&mut self, color: HighlightColor) -> Vec<ComparisonJob> {
        self.highlight = color;

        if self.reference.is_none() {
            return Vec::new();
        }

        let targets: Vec<usize> = match self.highlight_scope {
            HighlightScope::Current => self
                .selection
                .and_then(|id| self.candidates.iter().position(|c| c.id == id))
                .into_iter()
                .collect(),
            HighlightScope::All => (0..self.candidates.len()).collect(),
        };

        targets
            .into_iter()
            .filter_map(|index| {
                // A recolor job takes over a batch job's slot in the count
                let tracked = self.candidates[index].pending.is_some_and(|p| p.tracked);
                self.issue(index, JobKind::Recolor, tracked)
            })
            .collect()
    }

    // ========== Internals ==========

    /// Hold the listed state for the batch about to start; no-op mid-batch
    fn freeze(&mut self, reference: Option<ReferenceImage>) {
        if self.published.is_some() {
            return;
        }
        let results = self
            .candidates
            .iter()
            .filter(|c| c.committed)
            .map(|c| (c.id, c.results.clone()))
            .collect();
        self.published = Some(Published { reference, results });
    }

    /// Issue a job for the candidate at `index`, superseding any pending one
    fn issue(&mut self, index: usize, kind: JobKind, tracked: bool) -> Option<ComparisonJob> {
        let reference = self.reference.as_ref()?.image.clone();
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;

        let (epoch, highlight) = (self.epoch, self.highlight);
        let candidate = &mut self.candidates[index];
        candidate.pending = Some(Pending { ticket, tracked });

        Some(ComparisonJob::new(
            candidate.id,
            ticket,
            epoch,
            kind,
            highlight,
            reference,
            candidate.image.clone(),
        ))
    }

    /// Count one tracked job as done; returns true if the batch settled
    fn count_done(&mut self) -> bool {
        let Some(progress) = &mut self.progress else {
            return false;
        };
        progress.done += 1;
        self.finish_if_done()
    }

    /// Forget a tracked job whose candidate was removed
    fn count_dropped(&mut self) {
        if let Some(progress) = &mut self.progress {
            progress.total = progress.total.saturating_sub(1);
            self.finish_if_done();
        }
    }

    fn finish_if_done(&mut self) -> bool {
        match self.progress {
            Some(progress) if progress.done >= progress.total => {
                log::info!("Batch settled: {} candidates computed", progress.done);
                self.progress = None;
                self.published = None;
                true
            }
            _ => false,
        }
    }

    /// Re-derive the ranking, from the held results while a batch is in flight
    fn resort(&mut self) {
        self.ranking = match &self.published {
            Some(published) => ranking::rank_results(&published.results, self.active_mode),
            None => ranking::rank(&self.candidates, self.active_mode),
        };

        if self.selection.is_none() {
            self.selection = self.ranking.first().copied();
        }
    }
}

impl std::fmt::Debug for CandidateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateStore")
            .field("candidates", &self.candidates.len())
            .field("epoch", &self.epoch)
            .field("active_mode", &self.active_mode)
            .field("selection", &self.selection)
            .field("progress", &self.progress)
            .finish()
    }
}
