//! Async boundary around the diff primitive
//!
//! Each comparison runs on tokio's blocking pool so a slow diff never
//! stalls the update loop or other in-flight comparisons. The three modes
//! of one candidate are issued together and joined before anything is
//! handed back, so callers only ever see complete result sets.

use std::sync::Arc;

use image::RgbaImage;
use tokio::task;

use super::engine::DiffEngine;
use crate::error::{CompareError, Result};
use crate::state::data::{
    CandidateId, DiffResult, HighlightColor, ModeResult, ModeResults, SensitivityMode,
};

/// Engine handle shared between jobs
pub type SharedEngine = Arc<dyn DiffEngine>;

/// Compare one candidate against the reference in one mode
pub async fn compare(
    engine: SharedEngine,
    reference: Arc<RgbaImage>,
    candidate_image: Arc<RgbaImage>,
    candidate: CandidateId,
    mode: SensitivityMode,
    highlight: HighlightColor,
) -> Result<DiffResult> {
    let outcome = task::spawn_blocking(move || {
        engine.compare(&reference, &candidate_image, mode, highlight)
    })
    .await;

    let failed = |reason: String| CompareError::DiffComputation {
        candidate,
        mode,
        reason,
    };

    match outcome {
        Ok(Ok(result)) if result.mismatch_percent.is_finite() => Ok(DiffResult {
            mismatch_percent: result.mismatch_percent.clamp(0.0, 100.0),
            diff_image: result.diff_image,
        }),
        Ok(Ok(result)) => Err(failed(format!(
            "engine returned non-finite score {}",
            result.mismatch_percent
        ))),
        Ok(Err(reason)) => Err(failed(reason)),
        Err(join_error) => Err(failed(format!("diff task failed: {}", join_error))),
    }
}

/// Compare one candidate in every mode, concurrently
///
/// Never fails as a whole: a mode that errors becomes
/// [`ModeResult::Unavailable`] and the others are kept.
pub async fn compare_all_modes(
    engine: SharedEngine,
    reference: Arc<RgbaImage>,
    candidate_image: Arc<RgbaImage>,
    candidate: CandidateId,
    highlight: HighlightColor,
) -> ModeResults {
    let run = |mode| {
        compare(
            engine.clone(),
            reference.clone(),
            candidate_image.clone(),
            candidate,
            mode,
            highlight,
        )
    };

    let (exact, ignore_colors, ignore_antialiasing) = tokio::join!(
        run(SensitivityMode::Exact),
        run(SensitivityMode::IgnoreColors),
        run(SensitivityMode::IgnoreAntialiasing),
    );

    ModeResults {
        exact: settle(exact),
        ignore_colors: settle(ignore_colors),
        ignore_antialiasing: settle(ignore_antialiasing),
    }
}

fn settle(outcome: Result<DiffResult>) -> ModeResult {
    match outcome {
        Ok(result) => ModeResult::Ready(result),
        Err(e) => {
            log::warn!("{}", e);
            ModeResult::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::testing::{keyed_image, ScriptedEngine};

    #[tokio::test]
    async fn test_all_modes_are_computed() {
        let engine = Arc::new(ScriptedEngine::new().score(1, 7, [12.5, 8.0, 15.0]));

        let results = compare_all_modes(
            engine.clone(),
            keyed_image(1),
            keyed_image(7),
            CandidateId(1),
            HighlightColor::MAGENTA,
        )
        .await;

        assert_eq!(results.exact.mismatch_percent(), Some(12.5));
        assert_eq!(results.ignore_colors.mismatch_percent(), Some(8.0));
        assert_eq!(results.ignore_antialiasing.mismatch_percent(), Some(15.0));
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_mode_is_unavailable_not_fatal() {
        let engine = Arc::new(
            ScriptedEngine::new()
                .score(1, 7, [1.0, 2.0, 3.0])
                .fail(7, SensitivityMode::IgnoreColors),
        );

        let results = compare_all_modes(
            engine,
            keyed_image(1),
            keyed_image(7),
            CandidateId(3),
            HighlightColor::MAGENTA,
        )
        .await;

        assert_eq!(results.exact.mismatch_percent(), Some(1.0));
        assert!(results.ignore_colors.is_unavailable());
        assert!(results.is_degraded());
    }

    #[tokio::test]
    async fn test_error_carries_candidate_and_mode() {
        let engine = Arc::new(ScriptedEngine::new());

        let err = compare(
            engine,
            keyed_image(1),
            keyed_image(9),
            CandidateId(4),
            SensitivityMode::IgnoreAntialiasing,
            HighlightColor::MAGENTA,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CompareError::DiffComputation {
                candidate: CandidateId(4),
                mode: SensitivityMode::IgnoreAntialiasing,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_clamped() {
        let engine = Arc::new(ScriptedEngine::new().score(1, 2, [140.0, -3.0, 50.0]));

        let results = compare_all_modes(
            engine,
            keyed_image(1),
            keyed_image(2),
            CandidateId(1),
            HighlightColor::MAGENTA,
        )
        .await;

        assert_eq!(results.exact.mismatch_percent(), Some(100.0));
        assert_eq!(results.ignore_colors.mismatch_percent(), Some(0.0));
    }

    #[tokio::test]
    async fn test_non_finite_score_is_unavailable() {
        let engine = Arc::new(ScriptedEngine::new().score(1, 2, [f32::NAN, 1.0, 1.0]));

        let results = compare_all_modes(
            engine,
            keyed_image(1),
            keyed_image(2),
            CandidateId(1),
            HighlightColor::MAGENTA,
        )
        .await;

        assert!(results.exact.is_unavailable());
    }
}
