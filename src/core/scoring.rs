use crate::core::error::EngineError;
use crate::models::{Branch, NearbyBranch, ScoredCandidate, ScoringWeights};

/// Best possible rating; the rating term is `BEST_RATING / rating`
const BEST_RATING: f64 = 5.0;

/// Calculate a branch score (lower is better)
///
/// Scoring formula:
/// score = (
///     distance / max_distance * 0.55 +   # relative to the farthest candidate in the batch
///     load_rate * 0.35 +                 # current utilization, 0..1
///     5 / rating * 0.10                  # 1 for a perfect rating, 5 for the worst
/// )
///
/// `max_distance` is the largest distance of the batch being ranked, so scores
/// only compare within one batch. A batch where every candidate sits at the
/// origin contributes no distance term.
pub fn calculate_branch_score(
    branch: &Branch,
    distance: f64,
    max_distance: f64,
    weights: &ScoringWeights,
) -> Result<f64, EngineError> {
    if !(branch.rating.is_finite() && branch.rating > 0.0) {
        return Err(EngineError::DataIntegrity(format!(
            "branch {} has unscorable rating {}",
            branch.id, branch.rating
        )));
    }
    if !(distance.is_finite() && distance >= 0.0) {
        return Err(EngineError::DataIntegrity(format!(
            "branch {} has invalid distance {}",
            branch.id, distance
        )));
    }

    let distance_score = calculate_distance_score(distance, max_distance);
    let rating_score = BEST_RATING / branch.rating;

    Ok(distance_score * weights.distance
        + branch.load_rate * weights.load
        + rating_score * weights.rating)
}

/// Distance normalized into [0, 1] against the batch maximum
#[inline]
fn calculate_distance_score(distance: f64, max_distance: f64) -> f64 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    (distance / max_distance).min(1.0)
}

/// Score a batch of candidates and sort them ascending by score
///
/// The sort is stable, so equal scores keep the order the batch arrived in.
/// An empty batch ranks to an empty list.
pub fn rank_candidates(
    candidates: Vec<NearbyBranch>,
    weights: &ScoringWeights,
) -> Result<Vec<ScoredCandidate>, EngineError> {
    let max_distance = candidates
        .iter()
        .map(|candidate| candidate.distance)
        .fold(0.0_f64, f64::max);

    let mut scored = candidates
        .into_iter()
        .map(|candidate| {
            let score = calculate_branch_score(&candidate.branch, candidate.distance, max_distance, weights)?;
            Ok(ScoredCandidate {
                branch: candidate.branch,
                distance: candidate.distance,
                score,
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;

    scored.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(scored)
}
