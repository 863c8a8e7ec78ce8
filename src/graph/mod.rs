//! Spillover network analytics.
//!
//! Turns a directed spillover matrix into the structural data a force graph
//! needs: a symmetric adjacency matrix, Louvain communities, betweenness
//! centrality and a normalized edge list.
//!
//! ## Architecture
//!
//! ```text
//! WeightMatrix + codes ──► adjacency ──► AdjacencyMatrix
//!        │                                   │
//!        │                     ┌─────────────┴─────────────┐
//!        │                 louvain                 betweenness
//!        │                     │                           │
//!        └──► edges ──► Vec<GraphEdge> + degrees           │
//!                              │                           │
//!                      compute_all ──► NetworkAnalytics ◄──┘
//! ```
//!
//! ## Modules
//!
//! - [`models`] — Data structures (WeightMatrix, AdjacencyMatrix, GraphEdge, NetworkAnalytics, AnalyticsConfig)
//! - [`adjacency`] — Symmetrization and input validation
//! - [`edges`] — Thresholded, normalized edge list and node degrees
//! - [`algorithms`] — Louvain, modularity, betweenness (rustworkx-core), `compute_all`

pub mod adjacency;
pub mod algorithms;
pub mod edges;
pub mod models;

// Re-export primary types for convenience
pub use adjacency::{build_adjacency, validate_weights};
pub use algorithms::{
    betweenness_centrality, compute_all, compute_modularity, louvain, louvain_communities,
    LouvainResult,
};
pub use edges::{build_edge_list, node_degrees};
pub use models::{
    AdjacencyMatrix, AnalyticsConfig, CommunityInfo, GraphEdge, NetworkAnalytics, WeightMatrix,
};
