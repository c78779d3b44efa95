//! Self-evaluation of a freshly fitted index.
//!
//! Every producer queries the index with its own row. A first neighbor at
//! distance below [`SELF_MATCH_EPSILON`] is the producer itself (or an exact
//! duplicate) and is dropped; the remaining similarities are averaged. The
//! catalog score is the mean of those per-producer averages.

use index::{FeatureMatrix, IndexError, Neighbor, NeighborIndex};
use rayon::prelude::*;

pub const SELF_MATCH_EPSILON: f32 = 1e-6;

/// Mean neighbor similarity across the catalog, self-matches excluded.
///
/// Returns `NaN` when some producer has no neighbor besides itself; the
/// caller treats a non-finite score as a failed run.
pub fn mean_neighbor_similarity(
    index: &NeighborIndex,
    matrix: &FeatureMatrix,
    use_parallel: bool,
) -> Result<f64, IndexError> {
    let score_row = |row: &[f32]| -> Result<f64, IndexError> {
        let neighbors = index.kneighbors(matrix, row, None)?;
        Ok(row_score(&neighbors))
    };

    let scores: Vec<f64> = if use_parallel {
        let rows: Vec<&[f32]> = matrix.iter_rows().collect();
        rows.into_par_iter().map(score_row).collect::<Result<_, _>>()?
    } else {
        matrix.iter_rows().map(score_row).collect::<Result<_, _>>()?
    };

    if scores.is_empty() {
        return Ok(f64::NAN);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn row_score(neighbors: &[Neighbor]) -> f64 {
    let kept = match neighbors.first() {
        Some(first) if first.distance < SELF_MATCH_EPSILON => &neighbors[1..],
        _ => neighbors,
    };
    if kept.is_empty() {
        return f64::NAN;
    }
    kept.iter()
        .map(|n| 1.0 - f64::from(n.distance))
        .sum::<f64>()
        / kept.len() as f64
}
