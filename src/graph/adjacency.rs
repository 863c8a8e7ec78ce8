//! Directed → undirected symmetrization of the spillover matrix.

use super::models::{directed_weight, AdjacencyMatrix, WeightMatrix};
use crate::error::{Error, Result};

/// Build the symmetric adjacency matrix over `codes`.
///
/// For every unordered pair `(i, j)` the weight is the stronger of the two
/// directions, `max(w(i→j), w(j→i))`. Only codes listed in `codes` are
/// included; a code with no row in `matrix` behaves as an all-zero row.
/// The diagonal is always 0.
pub fn build_adjacency(matrix: &WeightMatrix, codes: &[String]) -> AdjacencyMatrix {
    let n = codes.len();
    let mut weights = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let forward = directed_weight(matrix, &codes[i], &codes[j]);
            let backward = directed_weight(matrix, &codes[j], &codes[i]);
            let w = forward.max(backward);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }

    AdjacencyMatrix::from_parts(codes.to_vec(), weights)
}

/// Reject malformed weights before any analytics run.
///
/// Sparse input is fine (missing entries are 0); negative, NaN or infinite
/// weights are not, since every downstream pass assumes `w >= 0`.
pub fn validate_weights(matrix: &WeightMatrix) -> Result<()> {
    for (from, row) in matrix {
        for (to, &w) in row {
            if !w.is_finite() {
                return Err(Error::invalid(format!(
                    "non-finite weight {from} -> {to}: {w}"
                )));
            }
            if w < 0.0 {
                return Err(Error::invalid(format!("negative weight {from} -> {to}: {w}")));
            }
        }
    }
    Ok(())
}
