//! Spillover network data models.
//!
//! Defines the type system shared by the analytics passes:
//!
//! ## Input types
//! - [`WeightMatrix`] — directed spillover weights keyed by node code
//!
//! ## Derived structure
//! - [`AdjacencyMatrix`] — symmetric, zero-diagonal weights over an ordered code list
//! - [`GraphEdge`] — a thresholded, normalized undirected edge
//!
//! ## Output types (analytics)
//! - [`CommunityInfo`] — metadata about a detected community
//! - [`NetworkAnalytics`] — aggregated result of a full analytics run
//!
//! ## Configuration
//! - [`AnalyticsConfig`] — thresholds and limits for the analytics passes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Input types
// ============================================================================

/// Directed spillover weights: `matrix[from][to]` is the shock propagated
/// from `from` into `to`. Missing entries mean weight 0.
pub type WeightMatrix = HashMap<String, HashMap<String, f64>>;

/// Look up a directed weight, defaulting to 0 when either side is absent.
pub fn directed_weight(matrix: &WeightMatrix, from: &str, to: &str) -> f64 {
    matrix
        .get(from)
        .and_then(|row| row.get(to))
        .copied()
        .unwrap_or(0.0)
}

// ============================================================================
// AdjacencyMatrix — symmetric view over an ordered code list
// ============================================================================

/// Symmetric weighted adjacency matrix.
///
/// Row/column `i` corresponds to `codes[i]`. Built once by
/// [`build_adjacency`](super::adjacency::build_adjacency) and immutable
/// afterwards: `weight(i, j) == weight(j, i)` and `weight(i, i) == 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdjacencyMatrix {
    codes: Vec<String>,
    weights: Vec<Vec<f64>>,
}

impl AdjacencyMatrix {
    pub(crate) fn from_parts(codes: Vec<String>, weights: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(codes.len(), weights.len());
        Self { codes, weights }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Node codes in row order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Row index of a node code.
    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }

    /// Symmetric weight between nodes `i` and `j`.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[i][j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.weights[i]
    }

    /// Weighted degree (row sum) of node `i`.
    pub fn degree(&self, i: usize) -> f64 {
        self.weights[i].iter().sum()
    }

    /// Sum of weights over unordered pairs (upper triangle).
    pub fn total_weight(&self) -> f64 {
        let n = self.len();
        (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| self.weights[i][j])
            .sum()
    }
}

// ============================================================================
// Output types
// ============================================================================

/// An undirected edge of the spillover network, as drawn by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Index of the first endpoint (always `< target`)
    pub source: usize,
    /// Index of the second endpoint
    pub target: usize,
    pub source_code: String,
    pub target_code: String,
    /// Raw symmetric weight (`max` of both directions)
    pub weight: f64,
    /// `weight` divided by the largest kept weight (0.0–1.0)
    pub normalized_weight: f64,
}

/// Metadata about a community detected by the Louvain pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityInfo {
    /// Community identifier (contiguous, zero-based)
    pub id: usize,
    /// Number of nodes in this community
    pub size: usize,
    /// Node codes belonging to this community, in input order
    pub members: Vec<String>,
}

/// Complete result of an analytics run over one spillover snapshot.
///
/// Every per-node vector is indexed like `adjacency.codes()`.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkAnalytics {
    pub adjacency: AdjacencyMatrix,
    /// Community id per node
    pub communities: Vec<usize>,
    /// Community summaries, largest first
    pub community_summaries: Vec<CommunityInfo>,
    /// Normalized betweenness centrality per node (0.0–1.0)
    pub centrality: Vec<f64>,
    pub edges: Vec<GraphEdge>,
    /// Number of kept edges touching each node
    pub degrees: Vec<usize>,
    /// Newman modularity of `communities`
    pub modularity: f64,
    pub node_count: usize,
    pub edge_count: usize,
    /// Computation time in milliseconds
    pub computation_ms: u64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the analytics passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Minimum symmetric weight for an edge to be listed (default: 0.005)
    pub min_edge_weight: f64,
    /// Minimum weight for an edge to carry shortest paths (default: 0.005)
    pub centrality_threshold: f64,
    /// Louvain local-moving passes before giving up (default: 15)
    pub louvain_max_passes: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_edge_weight: 0.005,
            centrality_threshold: 0.005,
            louvain_max_passes: 15,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
