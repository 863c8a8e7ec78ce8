//! Spillover network analytics.
//!
//! Implements the structural passes run over a symmetric adjacency matrix:
//! - **Community detection (Louvain)** — single-level greedy modularity optimization
//! - **Betweenness centrality** — via `rustworkx_core::centrality::betweenness_centrality` on a thresholded petgraph view
//! - **Modularity** — Newman's Q for a given assignment
//!
//! All passes are recomputed wholesale from an immutable matrix and return
//! vectors indexed like `AdjacencyMatrix::codes()`. Community detection and
//! centrality only read the matrix, so they can run independently.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use super::adjacency::{build_adjacency, validate_weights};
use super::edges::{build_edge_list, node_degrees};
use super::models::{AdjacencyMatrix, AnalyticsConfig, CommunityInfo, NetworkAnalytics, WeightMatrix};
use crate::error::Result;

/// Number of buckets used when the network has no weight at all.
const EMPTY_GRAPH_BUCKETS: usize = 4;

/// Floor for the betweenness normalization denominator.
const MIN_BETWEENNESS_SCALE: f64 = 1e-10;

// ============================================================================
// Community Detection — Louvain (single level)
// ============================================================================

/// Outcome of a Louvain run.
#[derive(Debug, Clone, PartialEq)]
pub struct LouvainResult {
    /// Contiguous community id per node, in discovery order
    pub communities: Vec<usize>,
    /// Modularity of the final partition, from the community accounting
    pub modularity: f64,
    /// Number of local-moving passes performed (0 for the empty-graph fallback)
    pub passes: usize,
}

/// Per-community accounting maintained while nodes move.
struct CommunityState {
    community: Vec<usize>,
    /// Sum of degrees of the nodes in each community
    sigma_tot: Vec<f64>,
    /// Sum of internal weights over ordered pairs (each edge counted twice)
    sigma_in: Vec<f64>,
}

impl CommunityState {
    fn singletons(degrees: &[f64]) -> Self {
        Self {
            community: (0..degrees.len()).collect(),
            sigma_tot: degrees.to_vec(),
            sigma_in: vec![0.0; degrees.len()],
        }
    }

    fn remove(&mut self, node: usize, degree: f64, weight_to_own: f64) {
        let c = self.community[node];
        self.sigma_tot[c] -= degree;
        self.sigma_in[c] -= 2.0 * weight_to_own;
    }

    fn insert(&mut self, node: usize, comm: usize, degree: f64, weight_to_comm: f64) {
        self.community[node] = comm;
        self.sigma_tot[comm] += degree;
        self.sigma_in[comm] += 2.0 * weight_to_comm;
    }

    fn modularity(&self, m2: f64) -> f64 {
        self.sigma_in
            .iter()
            .zip(&self.sigma_tot)
            .map(|(&inner, &tot)| inner / m2 - (tot / m2) * (tot / m2))
            .sum()
    }
}

/// Detect communities with one level of greedy modularity optimization.
///
/// Nodes are visited in index order for up to `max_passes` passes. Each node
/// is taken out of its community and placed in the neighboring community
/// with the greatest gain `w(i, c) - Σtot(c)·k_i / 2m`; only a strictly
/// positive gain beats staying put, and ties keep the community met first
/// in ascending neighbor order. The run stops early after a pass with no
/// moves. There is no aggregation phase.
///
/// A network with zero total weight is bucketed as `i mod 4` instead.
pub fn louvain(adj: &AdjacencyMatrix, max_passes: usize) -> LouvainResult {
    let n = adj.len();
    let total_weight = adj.total_weight();

    if total_weight == 0.0 {
        return LouvainResult {
            communities: (0..n).map(|i| i % EMPTY_GRAPH_BUCKETS).collect(),
            modularity: 0.0,
            passes: 0,
        };
    }

    let m2 = 2.0 * total_weight;
    let degrees: Vec<f64> = (0..n).map(|i| adj.degree(i)).collect();
    let mut state = CommunityState::singletons(&degrees);
    let mut passes = 0;

    // Neighbor-community tally, insertion ordered for deterministic ties
    let mut tally: Vec<(usize, f64)> = Vec::with_capacity(n);

    while passes < max_passes {
        passes += 1;
        let mut moves = 0usize;

        for i in 0..n {
            tally.clear();
            for (j, &w) in adj.row(i).iter().enumerate() {
                if j == i || w <= 0.0 {
                    continue;
                }
                let c = state.community[j];
                match tally.iter_mut().find(|(comm, _)| *comm == c) {
                    Some((_, acc)) => *acc += w,
                    None => tally.push((c, w)),
                }
            }

            let current = state.community[i];
            let weight_to = |c: usize| {
                tally
                    .iter()
                    .find(|(comm, _)| *comm == c)
                    .map_or(0.0, |&(_, w)| w)
            };

            state.remove(i, degrees[i], weight_to(current));

            let mut best_comm = current;
            let mut best_gain = 0.0;
            for &(c, w_to_c) in &tally {
                let gain = w_to_c - state.sigma_tot[c] * degrees[i] / m2;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = c;
                }
            }

            state.insert(i, best_comm, degrees[i], weight_to(best_comm));
            if best_comm != current {
                moves += 1;
            }
        }

        if moves == 0 {
            break;
        }
    }

    let modularity = state.modularity(m2);
    LouvainResult {
        communities: renumber(&state.community),
        modularity,
        passes,
    }
}

/// Community id per node; see [`louvain`].
pub fn louvain_communities(adj: &AdjacencyMatrix, max_passes: usize) -> Vec<usize> {
    louvain(adj, max_passes).communities
}

/// Renumber community ids to `0..k` in order of first appearance.
fn renumber(community: &[usize]) -> Vec<usize> {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    community
        .iter()
        .map(|c| {
            let next = remap.len();
            *remap.entry(*c).or_insert(next)
        })
        .collect()
}

/// Compute Newman's modularity Q for a given community assignment.
pub fn compute_modularity(adj: &AdjacencyMatrix, communities: &[usize]) -> f64 {
    let total_weight = adj.total_weight();
    if total_weight == 0.0 {
        return 0.0;
    }
    let m2 = 2.0 * total_weight;
    let degrees: Vec<f64> = (0..adj.len()).map(|i| adj.degree(i)).collect();

    let mut q = 0.0;
    for i in 0..adj.len() {
        for j in 0..adj.len() {
            if communities[i] == communities[j] {
                q += adj.weight(i, j) - degrees[i] * degrees[j] / m2;
            }
        }
    }
    q / m2
}

/// Group node codes by community, largest community first.
pub fn summarize_communities(codes: &[String], communities: &[usize]) -> Vec<CommunityInfo> {
    let k = communities.iter().copied().max().map_or(0, |max| max + 1);
    let mut summaries: Vec<CommunityInfo> = (0..k)
        .map(|id| CommunityInfo {
            id,
            size: 0,
            members: Vec::new(),
        })
        .collect();

    for (code, &c) in codes.iter().zip(communities) {
        summaries[c].size += 1;
        summaries[c].members.push(code.clone());
    }

    summaries.retain(|s| s.size > 0);
    summaries.sort_by(|a, b| b.size.cmp(&a.size).then(a.id.cmp(&b.id)));
    summaries
}

// ============================================================================
// Betweenness Centrality
// ============================================================================

/// Undirected petgraph view keeping only edges with weight `>= threshold`.
pub fn threshold_graph(adj: &AdjacencyMatrix, threshold: f64) -> UnGraph<(), ()> {
    let n = adj.len();
    let mut graph = UnGraph::with_capacity(n, n);
    for _ in 0..n {
        graph.add_node(());
    }
    for i in 0..n {
        for j in (i + 1)..n {
            if adj.weight(i, j) >= threshold {
                graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
            }
        }
    }
    graph
}

/// Compute betweenness centrality for all nodes, scaled into [0, 1].
///
/// Uses `rustworkx_core::centrality::betweenness_centrality` on the
/// thresholded view, so edges at or above `threshold` count as unweighted
/// hops. Raw scores are divided by the largest one (floored at 1e-10, so a
/// network without through-paths scores all zeros).
pub fn betweenness_centrality(adj: &AdjacencyMatrix, threshold: f64) -> Vec<f64> {
    let graph = threshold_graph(adj, threshold);
    let mut scores: Vec<f64> = rustworkx_core::centrality::betweenness_centrality(
        &graph, false, // include_endpoints
        false, // normalized (we scale by the max below)
        200,   // parallel_threshold
    )
    .into_iter()
    .map(|s| s.unwrap_or(0.0))
    .collect();

    let max = scores.iter().copied().fold(0.0f64, f64::max);
    let scale = max.max(MIN_BETWEENNESS_SCALE);
    scores.iter_mut().for_each(|s| *s /= scale);
    scores
}

// ============================================================================
// Orchestrator: compute_all
// ============================================================================

/// Run every analytics pass over one spillover snapshot.
///
/// Execution order:
/// 1. Weight validation (rejects negative / non-finite weights)
/// 2. Symmetric adjacency
/// 3. Community detection (Louvain) and betweenness centrality
/// 4. Edge list (straight from the directed matrix) and degrees
pub fn compute_all(
    matrix: &WeightMatrix,
    codes: &[String],
    config: &AnalyticsConfig,
) -> Result<NetworkAnalytics> {
    let start = std::time::Instant::now();

    validate_weights(matrix)?;

    let adjacency = build_adjacency(matrix, codes);
    let LouvainResult {
        communities,
        modularity,
        passes,
    } = louvain(&adjacency, config.louvain_max_passes);
    let centrality = betweenness_centrality(&adjacency, config.centrality_threshold);
    let edges = build_edge_list(matrix, codes, config.min_edge_weight);
    let degrees = node_degrees(&edges, codes.len());
    let community_summaries = summarize_communities(codes, &communities);

    let elapsed = start.elapsed();
    tracing::debug!(
        "Spillover analytics: {} nodes, {} edges, {} communities (Q = {:.4}, {} passes) in {:?}",
        codes.len(),
        edges.len(),
        community_summaries.len(),
        modularity,
        passes,
        elapsed
    );

    Ok(NetworkAnalytics {
        node_count: codes.len(),
        edge_count: edges.len(),
        adjacency,
        communities,
        community_summaries,
        centrality,
        edges,
        degrees,
        modularity,
        computation_ms: elapsed.as_millis() as u64,
    })
}

// ============================================================================
// Tests
// ============================================================================
