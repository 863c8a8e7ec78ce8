//! Thresholded, normalized edge list for rendering.
//!
//! Works straight from the directed matrix rather than from an
//! [`AdjacencyMatrix`](super::models::AdjacencyMatrix), so the edge list can
//! be produced without building the full n×n matrix.

use super::models::{directed_weight, GraphEdge, WeightMatrix};

/// Derive the undirected edge list over `codes`.
///
/// A pair `i < j` is kept when `max(w(i→j), w(j→i)) >= min_weight`. Each
/// kept edge's `normalized_weight` is its weight divided by the largest kept
/// weight, or 0 when that maximum is 0.
pub fn build_edge_list(matrix: &WeightMatrix, codes: &[String], min_weight: f64) -> Vec<GraphEdge> {
    let n = codes.len();

    // Pass 1: collect kept pairs and the running maximum
    let mut kept: Vec<(usize, usize, f64)> = Vec::new();
    let mut max_weight = 0.0f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let forward = directed_weight(matrix, &codes[i], &codes[j]);
            let backward = directed_weight(matrix, &codes[j], &codes[i]);
            let w = forward.max(backward);
            if w >= min_weight {
                max_weight = max_weight.max(w);
                kept.push((i, j, w));
            }
        }
    }

    // Pass 2: normalize
    kept.into_iter()
        .map(|(i, j, w)| GraphEdge {
            source: i,
            target: j,
            source_code: codes[i].clone(),
            target_code: codes[j].clone(),
            weight: w,
            normalized_weight: if max_weight > 0.0 { w / max_weight } else { 0.0 },
        })
        .collect()
}

/// Count edge endpoints per node (each edge adds 1 to both ends).
pub fn node_degrees(edges: &[GraphEdge], node_count: usize) -> Vec<usize> {
    let mut degrees = vec![0usize; node_count];
    for edge in edges {
        degrees[edge.source] += 1;
        degrees[edge.target] += 1;
    }
    degrees
}
