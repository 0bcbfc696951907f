//! Ranking of committed candidates by mismatch score
//!
//! The ordering is derived, never stored as truth: it is recomputed from
//! the store's insertion-ordered candidates whenever something changes.

use std::cmp::Ordering;

use super::data::{Candidate, CandidateId, ModeResults, SensitivityMode};

/// Sort committed candidates by ascending mismatch in `mode`
///
/// The sort is stable over insertion order, so equal scores keep their
/// relative order no matter how often the list is re-sorted. Candidates
/// whose score is unavailable in `mode` go last.
pub fn rank(candidates: &[Candidate], mode: SensitivityMode) -> Vec<CandidateId> {
    order(
        candidates
            .iter()
            .filter(|c| c.committed)
            .map(|c| (c.id, c.score(mode))),
    )
}

/// Same ordering over results held apart from the candidates, in insertion order
pub fn rank_results(results: &[(CandidateId, ModeResults)], mode: SensitivityMode) -> Vec<CandidateId> {
    order(
        results
            .iter()
            .map(|(id, results)| (*id, results.get(mode).mismatch_percent())),
    )
}

fn order(scored: impl Iterator<Item = (CandidateId, Option<f32>)>) -> Vec<CandidateId> {
    let mut listed: Vec<(CandidateId, Option<f32>)> = scored.collect();
    listed.sort_by(|a, b| compare_scores(a.1, b.1));
    listed.into_iter().map(|(id, _)| id).collect()
}

fn compare_scores(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The candidate to select when `removed` (the current one) disappears
///
/// Prefers the previous entry in list order, else the next one. Returns
/// `None` when `removed` was the only entry.
pub fn fallback_selection(ranking: &[CandidateId], removed: CandidateId) -> Option<CandidateId> {
    let index = ranking.iter().position(|&id| id == removed)?;
    if index > 0 {
        Some(ranking[index - 1])
    } else {
        ranking.get(index + 1).copied()
    }
}
