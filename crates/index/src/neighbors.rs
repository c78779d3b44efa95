//! Exact k-nearest-neighbor search under cosine distance.
//!
//! The catalog holds tens to low thousands of producers, so every query is a
//! brute-force scan over the feature matrix. Row norms are computed once at
//! fit time and stored with the index.
//!
//! Distance is `1 - cosine_similarity`; a zero-norm row or query has
//! similarity 0 and therefore distance 1. Results are ordered by ascending
//! distance, ties broken by row index, so identical inputs always yield
//! identical neighbor lists.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{FeatureMatrix, IndexError};

/// One neighbor of a query: the matrix row and its cosine distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl Neighbor {
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// A fitted brute-force cosine index over a [`FeatureMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborIndex {
    n_neighbors: usize,
    width: usize,
    norms: Vec<f64>,
}

impl NeighborIndex {
    /// Fits the index. `n_neighbors` must be between 1 and the row count.
    pub fn fit(matrix: &FeatureMatrix, n_neighbors: usize) -> Result<Self, IndexError> {
        if matrix.is_empty() {
            return Err(IndexError::EmptyMatrix);
        }
        if n_neighbors == 0 || n_neighbors > matrix.rows() {
            return Err(IndexError::InvalidNeighbors {
                requested: n_neighbors,
                rows: matrix.rows(),
            });
        }
        Ok(Self {
            n_neighbors,
            width: matrix.width(),
            norms: matrix.iter_rows().map(encoder::norm).collect(),
        })
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// The index was fitted on a matrix of this shape.
    pub fn matches(&self, matrix: &FeatureMatrix) -> bool {
        self.width == matrix.width() && self.norms.len() == matrix.rows()
    }

    /// The `k` nearest rows to `query` (the fitted `n_neighbors` when `k` is
    /// `None`), nearest first.
    pub fn kneighbors(
        &self,
        matrix: &FeatureMatrix,
        query: &[f32],
        k: Option<usize>,
    ) -> Result<Vec<Neighbor>, IndexError> {
        self.check_shape(matrix)?;
        if query.len() != self.width {
            return Err(IndexError::WidthMismatch {
                expected: self.width,
                found: query.len(),
            });
        }
        let k = k.unwrap_or(self.n_neighbors).min(self.norms.len());
        let query_norm = encoder::norm(query);

        let mut neighbors: Vec<Neighbor> = matrix
            .iter_rows()
            .zip(&self.norms)
            .enumerate()
            .map(|(index, (row, row_norm))| Neighbor {
                index,
                distance: cosine_distance(query, query_norm, row, *row_norm),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }

    /// Neighbors of every row of the fitted matrix, each row querying itself.
    pub fn kneighbors_all(&self, matrix: &FeatureMatrix) -> Result<Vec<Vec<Neighbor>>, IndexError> {
        self.check_shape(matrix)?;
        matrix
            .iter_rows()
            .map(|row| self.kneighbors(matrix, row, None))
            .collect()
    }

    fn check_shape(&self, matrix: &FeatureMatrix) -> Result<(), IndexError> {
        if self.matches(matrix) {
            Ok(())
        } else {
            Err(IndexError::InvalidSnapshot(format!(
                "index fitted on {}x{} but matrix is {}x{}",
                self.norms.len(),
                self.width,
                matrix.rows(),
                matrix.width()
            )))
        }
    }
}

fn cosine_distance(query: &[f32], query_norm: f64, row: &[f32], row_norm: f64) -> f32 {
    if query_norm == 0.0 || row_norm == 0.0 {
        return 1.0;
    }
    let dot: f64 = query
        .iter()
        .zip(row)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum();
    (1.0 - dot / (query_norm * row_norm)).clamp(0.0, 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            3,
            [
                [2.0, 0.0, 0.0],
                [2.0, 2.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn fit_rejects_empty_and_oversized_k() {
        assert!(matches!(
            NeighborIndex::fit(&FeatureMatrix::new(3), 1),
            Err(IndexError::EmptyMatrix)
        ));
        assert!(matches!(
            NeighborIndex::fit(&matrix(), 5),
            Err(IndexError::InvalidNeighbors { requested: 5, rows: 4 })
        ));
        assert!(NeighborIndex::fit(&matrix(), 0).is_err());
    }

    #[test]
    fn self_is_nearest_with_zero_distance() {
        let m = matrix();
        let index = NeighborIndex::fit(&m, 4).unwrap();
        let hits = index.kneighbors(&m, m.row(1).unwrap(), None).unwrap();
        assert_eq!(hits[0].index, 1);
        assert!(hits[0].distance < 1e-6);
        assert_eq!(hits[1].index, 0);
        assert!((hits[1].similarity() - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn zero_norm_rows_sit_at_distance_one() {
        let m = matrix();
        let index = NeighborIndex::fit(&m, 4).unwrap();
        let hits = index.kneighbors(&m, &[1.0, 0.0, 0.0], None).unwrap();
        let last_two: Vec<_> = hits[2..].iter().map(|n| (n.index, n.distance)).collect();
        // orthogonal row and zero row tie at 1.0; lower index first
        assert_eq!(last_two, vec![(2, 1.0), (3, 1.0)]);
    }

    #[test]
    fn k_is_capped_and_overridable() {
        let m = matrix();
        let index = NeighborIndex::fit(&m, 2).unwrap();
        assert_eq!(index.kneighbors(&m, &[0.0, 0.0, 1.0], None).unwrap().len(), 2);
        assert_eq!(index.kneighbors(&m, &[0.0, 0.0, 1.0], Some(10)).unwrap().len(), 4);
    }

    #[test]
    fn mismatched_query_or_matrix_is_rejected() {
        let m = matrix();
        let index = NeighborIndex::fit(&m, 2).unwrap();
        assert!(matches!(
            index.kneighbors(&m, &[1.0], None),
            Err(IndexError::WidthMismatch { .. })
        ));
        let other = FeatureMatrix::from_rows(3, [[1.0, 0.0, 0.0]]).unwrap();
        assert!(index.kneighbors_all(&other).is_err());
    }

    #[test]
    fn kneighbors_all_returns_one_list_per_row() {
        let m = matrix();
        let index = NeighborIndex::fit(&m, 3).unwrap();
        let all = index.kneighbors_all(&m).unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|n| n.len() == 3));
    }
}
