//! ForceAtlas2 force-directed layout.
//!
//! ## Architecture
//!
//! ```text
//! codes + positions + degrees ──► build_layout_nodes ──► Vec<LayoutNode>
//! Vec<GraphEdge> ──────────────► layout_edges ───────► Vec<LayoutEdge>
//!                                                          │
//!                                     LayoutSession ◄──────┘
//!                                          │  advance()
//!                         FrameScheduler ──┤──► force_atlas::step
//!                                          ▼
//!                                    PositionSink ◄── PositionSnapshot
//! ```
//!
//! ## Modules
//!
//! - [`models`] — Position, Viewport, LayoutNode, LayoutEdge, LayoutConfig
//! - [`force_atlas`] — The single-frame step function and phase multiplier
//! - [`session`] — Owned simulation buffer, publish policy, construction helpers
//! - [`scheduler`] — Tokio and immediate frame drivers, cancellation, drag overrides

pub mod force_atlas;
pub mod models;
pub mod scheduler;
pub mod session;

pub use force_atlas::{phase_multiplier, step};
pub use models::{LayoutConfig, LayoutEdge, LayoutNode, Position, Viewport};
pub use scheduler::{
    start_layout, CancelHandle, DragHandle, DragOverride, FrameScheduler, ImmediateScheduler,
    LayoutRun, StepFn, TokioFrameScheduler,
};
pub use session::{
    build_layout_nodes, circular_positions, layout_edges, FrameControl, LayoutSession,
    PositionSink, PositionSnapshot, PublishPolicy,
};
