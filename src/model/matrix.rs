//! Symmetric connection-strength matrix.
//!
//! Backed by a flat row-major `ndarray::Array2`. Every write goes through
//! [`ConnectionMatrix::set`], which clamps to `[0, 1]` and mirrors the value so
//! `m[i][j] == m[j][i]` holds at all times. The diagonal is never written.

use std::ops::Index;

use ndarray::Array2;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SimError};

/// Tolerance used when accepting externally supplied matrices as symmetric
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric N×N matrix of connection strengths in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionMatrix {
    data: Array2<f64>,
}

impl ConnectionMatrix {
    /// All-zero matrix for `n` agents.
    pub fn new(n: usize) -> Self {
        Self {
            data: Array2::zeros((n, n)),
        }
    }

    /// Build from nested rows, validating shape, range and symmetry.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let mut matrix = Self::new(n);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(SimError::InvalidInput(format!(
                    "connection matrix row {i} has {} entries, expected {n}",
                    row.len()
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(SimError::InvalidInput(format!(
                        "connection strength at ({i}, {j}) is {value}, expected [0, 1]"
                    )));
                }
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if (rows[i][j] - rows[j][i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(SimError::InvalidInput(format!(
                        "connection matrix is not symmetric at ({i}, {j})"
                    )));
                }
                matrix.set(i, j, rows[i][j]);
            }
        }

        Ok(matrix)
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// True when the matrix covers no agents.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds-checked read.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.data.get((i, j)).copied()
    }

    /// Set the strength of the `(i, j)` pair, clamped to `[0, 1]`.
    ///
    /// Writes both mirrored cells and returns the stored value. Self-pairs are
    /// ignored and read back as `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> f64 {
        if i == j {
            return 0.0;
        }
        let clamped = value.clamp(0.0, 1.0);
        self.data[[i, j]] = clamped;
        self.data[[j, i]] = clamped;
        clamped
    }

    /// Add `delta` to the pair's strength (clamped) and return the new value.
    pub fn adjust(&mut self, i: usize, j: usize, delta: f64) -> f64 {
        let current = self.data[[i, j]];
        self.set(i, j, current + delta)
    }

    /// Whether `i` and `j` are linked by a strictly positive strength.
    ///
    /// This is the edge predicate used by every graph algorithm; the display
    /// threshold is applied separately by [`edges_above`](Self::edges_above).
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        i != j && self.get(i, j).is_some_and(|s| s > 0.0)
    }

    /// Agents linked to `i` by a strictly positive strength.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.data
            .row(i)
            .into_iter()
            .enumerate()
            .filter(move |&(j, &s)| j != i && s > 0.0)
            .map(|(j, _)| j)
    }

    /// Pairs `i < j` whose strength is at least `threshold`.
    pub fn edges_above(&self, threshold: f64) -> Vec<(usize, usize, f64)> {
        let n = self.len();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let strength = self.data[[i, j]];
                if strength >= threshold {
                    edges.push((i, j, strength));
                }
            }
        }
        edges
    }

    /// Mean strength over all unordered pairs; `0.0` with fewer than two agents.
    pub fn mean_strength(&self) -> f64 {
        let n = self.len();
        if n < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                total += self.data[[i, j]];
            }
        }
        total / (n * (n - 1) / 2) as f64
    }

    /// True when every mirrored pair is exactly equal.
    pub fn is_symmetric(&self) -> bool {
        self.data == self.data.t()
    }

    /// True when every entry lies in `[0, 1]`.
    pub fn in_bounds(&self) -> bool {
        self.data.iter().all(|s| (0.0..=1.0).contains(s))
    }

    /// Nested-row copy, for export.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.data.outer_iter().map(|row| row.to_vec()).collect()
    }

    /// Underlying row-major array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Undirected graph containing the pairs at or above `threshold`.
    ///
    /// Node weights are agent ids, edge weights are strengths.
    pub fn to_graph(&self, threshold: f64) -> UnGraph<usize, f64> {
        let mut graph = UnGraph::with_capacity(self.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.len()).map(|i| graph.add_node(i)).collect();
        for (i, j, strength) in self.edges_above(threshold) {
            graph.add_edge(nodes[i], nodes[j], strength);
        }
        graph
    }
}

impl Index<(usize, usize)> for ConnectionMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[[i, j]]
    }
}

impl Serialize for ConnectionMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConnectionMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Self::from_rows(&rows).map_err(serde::de::Error::custom)
    }
}
