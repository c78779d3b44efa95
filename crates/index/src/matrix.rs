use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Row-major feature matrix with a fixed row width.
///
/// Rows are stored contiguously; row `i` corresponds to the `i`-th producer
/// of the snapshot that owns the matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    width: usize,
    rows: usize,
    data: Vec<f32>,
}

impl FeatureMatrix {
    pub fn new(width: usize) -> Self {
        Self::with_capacity(width, 0)
    }

    pub fn with_capacity(width: usize, rows: usize) -> Self {
        Self {
            width,
            rows: 0,
            data: Vec::with_capacity(width * rows),
        }
    }

    /// Builds a matrix from rows, rejecting any row of the wrong width.
    pub fn from_rows<I, R>(width: usize, rows: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f32]>,
    {
        let mut matrix = Self::new(width);
        for row in rows {
            matrix.push_row(row.as_ref())?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: &[f32]) -> Result<(), IndexError> {
        if row.len() != self.width {
            return Err(IndexError::WidthMismatch {
                expected: self.width,
                found: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.width;
        self.data.get(start..start + self.width)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    /// Storage matches the declared shape. Checked after decoding.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width * self.rows
    }
}
