//! Weighted similarity between emergent places and between practices
//!
//! Every score is a weighted mean of per-attribute closeness values in
//! [0, 1], so results stay in [0, 1] whatever the weights' scale.

use crate::config::{PracticeSimilarityWeights, SimilarityWeights};
use crate::derive::EmergentPlace;
use crate::error::ChoraResult;
use crate::model::{Practice, TimeWindow};
use chrono::Timelike;
use std::collections::HashSet;
use std::hash::Hash;

/// Jaccard index of two tag sets; two empty sets are identical
pub fn jaccard<T: Eq + Hash>(a: impl IntoIterator<Item = T>, b: impl IntoIterator<Item = T>) -> f64 {
    let a: HashSet<T> = a.into_iter().collect();
    let b: HashSet<T> = b.into_iter().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

fn weighted_mean(terms: &[(f64, f64)]) -> f64 {
    let total: f64 = terms.iter().map(|(w, _)| w).sum();
    if total <= 0.0 {
        return 0.0;
    }
    terms.iter().map(|(w, v)| w * v).sum::<f64>() / total
}

/// Similarity of two places by familiarity, affect and meaning symbols.
///
/// A place without affect is compared as neutral (valence 0, arousal 0).
pub fn place_similarity(a: &EmergentPlace, b: &EmergentPlace, weights: &SimilarityWeights) -> ChoraResult<f64> {
    weights.validate()?;
    let affect = |p: &EmergentPlace| p.affect.as_ref().map_or((0.0, 0.0), |a| (a.valence, a.arousal));
    let ((va, aa), (vb, ab)) = (affect(a), affect(b));

    Ok(weighted_mean(&[
        (weights.familiarity, 1.0 - (a.familiarity - b.familiarity).abs()),
        (weights.valence, 1.0 - (va - vb).abs() / 2.0),
        (weights.arousal, 1.0 - (aa - ab).abs() / 2.0),
        (weights.symbols, jaccard(a.symbols(), b.symbols())),
    ]))
}

fn midpoint_hour(window: &TimeWindow) -> f64 {
    let earliest = window.earliest.num_seconds_from_midnight() as f64 / 3600.0;
    earliest + window.spread_hours() / 2.0
}

fn time_of_day_closeness(a: Option<&TimeWindow>, b: Option<&TimeWindow>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = (midpoint_hour(a) - midpoint_hour(b)).abs();
            1.0 - diff.min(24.0 - diff) / 12.0
        }
        (None, None) => 1.0,
        _ => 0.0,
    }
}

/// Similarity of two practices by regularity, frequency, time of day and labels.
///
/// Frequency closeness is the ratio of the smaller to the larger frequency,
/// and zero unless both are positive.
pub fn practice_similarity(a: &Practice, b: &Practice, weights: &PracticeSimilarityWeights) -> ChoraResult<f64> {
    weights.validate()?;
    let frequency = if a.frequency > 0.0 && b.frequency > 0.0 {
        a.frequency.min(b.frequency) / a.frequency.max(b.frequency)
    } else {
        0.0
    };

    Ok(weighted_mean(&[
        (weights.regularity, 1.0 - (a.regularity - b.regularity).abs()),
        (weights.frequency, frequency),
        (
            weights.time_of_day,
            time_of_day_closeness(a.time_window.as_ref(), b.time_window.as_ref()),
        ),
        (weights.labels, jaccard(&a.labels, &b.labels)),
    ]))
}
