//! Comparison jobs issued by the store
//!
//! A job is a snapshot of everything a comparison needs, taken when the
//! job is issued: the reference pixels, the candidate pixels, the highlight
//! color and the reference epoch. Changing any of them afterwards never
//! affects a job already in flight. The job's result comes back to the store
//! as a [`JobOutcome`], which the store accepts or drops as stale.

use std::sync::Arc;

use image::RgbaImage;

use super::data::{CandidateId, HighlightColor, ModeResults, Ticket};
use crate::diff::{self, SharedEngine};

/// Why a job was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// First computation of a newly added candidate
    Ingest,
    /// Reference changed or explicit bulk recomputation
    Recalculate,
    /// Highlight color changed
    Recolor,
}

/// One candidate's three-mode comparison, ready to run
#[derive(Debug, Clone)]
pub struct ComparisonJob {
    pub candidate: CandidateId,
    pub ticket: Ticket,
    pub epoch: u64,
    pub kind: JobKind,
    pub highlight: HighlightColor,
    reference: Arc<RgbaImage>,
    candidate_image: Arc<RgbaImage>,
}

impl ComparisonJob {
    pub(crate) fn new(
        candidate: CandidateId,
        ticket: Ticket,
        epoch: u64,
        kind: JobKind,
        highlight: HighlightColor,
        reference: Arc<RgbaImage>,
        candidate_image: Arc<RgbaImage>,
    ) -> Self {
        Self {
            candidate,
            ticket,
            epoch,
            kind,
            highlight,
            reference,
            candidate_image,
        }
    }

    /// Run all three modes concurrently and package the result
    pub async fn run(self, engine: SharedEngine) -> JobOutcome {
        let results = diff::compare_all_modes(
            engine,
            self.reference,
            self.candidate_image,
            self.candidate,
            self.highlight,
        )
        .await;

        JobOutcome {
            candidate: self.candidate,
            ticket: self.ticket,
            epoch: self.epoch,
            results,
        }
    }
}

/// A finished job on its way back to the store
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub candidate: CandidateId,
    pub ticket: Ticket,
    pub epoch: u64,
    pub results: ModeResults,
}
