//! Test helper factories
//!
//! Provides convenience builders for spillover matrices, code lists and
//! layout buffers with sensible defaults.
#![allow(dead_code)]

use crate::graph::models::WeightMatrix;
use crate::layout::models::{LayoutEdge, LayoutNode, Position};

// ============================================================================
// Matrix builders
// ============================================================================

/// Owned code list from string literals.
pub fn codes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Build a directed matrix from `(from, to, weight)` triples.
pub fn matrix_from(entries: &[(&str, &str, f64)]) -> WeightMatrix {
    let mut m = WeightMatrix::new();
    for &(from, to, w) in entries {
        m.entry(from.to_string())
            .or_default()
            .insert(to.to_string(), w);
    }
    m
}

/// The three-node reference network:
/// `A→B=0.5, B→A=0.2, B→C=0.6, C→B=0.1, A→C=0`.
pub fn example_matrix() -> WeightMatrix {
    matrix_from(&[
        ("A", "B", 0.5),
        ("B", "A", 0.2),
        ("B", "C", 0.6),
        ("C", "B", 0.1),
        ("A", "C", 0.0),
    ])
}

/// Two dense cliques `a_*` and `b_*` joined by a single `a_0 → b_0` bridge.
pub fn two_cliques(size: usize, bridge: f64) -> (WeightMatrix, Vec<String>) {
    let a: Vec<String> = (0..size).map(|i| format!("a_{i}")).collect();
    let b: Vec<String> = (0..size).map(|i| format!("b_{i}")).collect();
    let mut m = WeightMatrix::new();
    for group in [&a, &b] {
        for from in group.iter() {
            for to in group.iter() {
                if from != to {
                    m.entry(from.clone()).or_default().insert(to.clone(), 1.0);
                }
            }
        }
    }
    m.entry(a[0].clone())
        .or_default()
        .insert(b[0].clone(), bridge);
    (m, a.into_iter().chain(b).collect())
}

/// Dense `n × n` weight rows for direct algorithm tests.
pub fn dense(rows: &[&[f64]]) -> Vec<Vec<f64>> {
    rows.iter().map(|r| r.to_vec()).collect()
}

// ============================================================================
// Layout builders
// ============================================================================

/// Layout nodes at the given positions with the given degrees.
pub fn layout_nodes(positions: &[(f64, f64)], degrees: &[usize]) -> Vec<LayoutNode> {
    positions
        .iter()
        .zip(degrees)
        .map(|(&(x, y), &d)| LayoutNode::new(Position::new(x, y), d))
        .collect()
}

pub fn layout_edge(source: usize, target: usize, weight: f64) -> LayoutEdge {
    LayoutEdge {
        source,
        target,
        weight,
    }
}

/// Smallest pairwise distance in a node buffer.
pub fn min_separation(nodes: &[LayoutNode]) -> f64 {
    let mut min = f64::INFINITY;
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            min = min.min(nodes[i].position().distance(&nodes[j].position()));
        }
    }
    min
}
