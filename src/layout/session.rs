//! Layout session — the owned simulation buffer for one visualization.
//!
//! A [`LayoutSession`] holds the node buffer, edges, configuration and frame
//! counter of a single simulation run. It is advanced one frame at a time
//! by whoever drives it (see [`scheduler`](super::scheduler)) and publishes
//! position snapshots according to its [`PublishPolicy`]. Fresh source data
//! replaces the whole buffer through [`LayoutSession::reset`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use super::force_atlas::step;
use super::models::{LayoutConfig, LayoutEdge, LayoutNode, Position, Viewport};
use crate::error::{Error, Result};
use crate::graph::models::GraphEdge;

// ============================================================================
// Publishing
// ============================================================================

/// Node positions reported to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// Index of the frame just applied (0-based)
    pub frame: usize,
    pub positions: Vec<Position>,
    /// True for the snapshot of the last budgeted frame
    pub finished: bool,
}

/// Receiver of published position snapshots.
pub trait PositionSink: Send {
    fn publish(&mut self, snapshot: PositionSnapshot);
}

impl PositionSink for Vec<PositionSnapshot> {
    fn publish(&mut self, snapshot: PositionSnapshot) {
        self.push(snapshot);
    }
}

impl PositionSink for tokio::sync::mpsc::UnboundedSender<PositionSnapshot> {
    fn publish(&mut self, snapshot: PositionSnapshot) {
        if self.send(snapshot).is_err() {
            tracing::warn!("Position receiver dropped; snapshot discarded");
        }
    }
}

/// How often positions are flushed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPolicy {
    /// Publish after every `every`-th frame (frames 0, k, 2k, …)
    pub every: usize,
}

impl PublishPolicy {
    pub fn every(every: usize) -> Result<Self> {
        if every == 0 {
            return Err(Error::invalid("publish interval must be at least 1 frame"));
        }
        Ok(Self { every })
    }

    /// Whether the snapshot after `frame` should be published.
    /// The last budgeted frame is always published.
    pub fn should_publish(&self, frame: usize, total_frames: usize) -> bool {
        frame % self.every == 0 || frame + 1 == total_frames
    }
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self { every: 3 }
    }
}

/// Whether a driver should keep requesting frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Finished,
}

// ============================================================================
// Session
// ============================================================================

/// One simulation run over one data snapshot.
#[derive(Debug, Clone)]
pub struct LayoutSession {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    config: LayoutConfig,
    frame: usize,
    total_frames: usize,
    publish: PublishPolicy,
}

impl LayoutSession {
    /// Create a session with the default publish policy.
    ///
    /// Fails if the config is invalid, the frame budget is zero, or an edge
    /// references a node outside the buffer.
    pub fn new(
        nodes: Vec<LayoutNode>,
        edges: Vec<LayoutEdge>,
        config: LayoutConfig,
        total_frames: usize,
    ) -> Result<Self> {
        config.validate()?;
        if total_frames == 0 {
            return Err(Error::invalid("total_frames must be at least 1"));
        }
        check_edges(&edges, nodes.len())?;

        Ok(Self {
            nodes,
            edges,
            config,
            frame: 0,
            total_frames,
            publish: PublishPolicy::default(),
        })
    }

    pub fn with_publish_policy(mut self, publish: PublishPolicy) -> Self {
        self.publish = publish;
        self
    }

    /// Replace the buffer with fresh data and restart at frame 0.
    pub fn reset(&mut self, nodes: Vec<LayoutNode>, edges: Vec<LayoutEdge>) -> Result<()> {
        check_edges(&edges, nodes.len())?;
        self.nodes = nodes;
        self.edges = edges;
        self.frame = 0;
        Ok(())
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Index of the next frame to apply.
    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn is_finished(&self) -> bool {
        self.frame >= self.total_frames
    }

    pub fn positions(&self) -> Vec<Position> {
        self.nodes.iter().map(LayoutNode::position).collect()
    }

    /// Drag override: move a node between steps.
    ///
    /// The node's force history is cleared so the next adaptive-speed
    /// computation does not read the jump as oscillation.
    pub fn set_position(&mut self, index: usize, position: Position) -> Result<()> {
        let node_count = self.nodes.len();
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(Error::NodeOutOfRange { index, node_count })?;
        node.x = position.x;
        node.y = position.y;
        node.dx = 0.0;
        node.dy = 0.0;
        node.old_dx = 0.0;
        node.old_dy = 0.0;
        Ok(())
    }

    /// Apply one frame and publish if the policy says so.
    pub fn advance(&mut self, sink: &mut dyn PositionSink) -> FrameControl {
        if self.is_finished() {
            return FrameControl::Finished;
        }

        let frame = self.frame;
        step(
            &mut self.nodes,
            &self.edges,
            &self.config,
            frame,
            self.total_frames,
        );
        self.frame += 1;

        let finished = self.is_finished();
        if self.publish.should_publish(frame, self.total_frames) {
            sink.publish(PositionSnapshot {
                frame,
                positions: self.positions(),
                finished,
            });
        }

        if finished {
            tracing::info!(
                "Layout finished after {} frames ({} nodes, {} edges)",
                self.total_frames,
                self.nodes.len(),
                self.edges.len()
            );
            FrameControl::Finished
        } else {
            FrameControl::Continue
        }
    }

    /// Apply every remaining frame back to back.
    pub fn run_to_end(&mut self, sink: &mut dyn PositionSink) {
        while self.advance(sink) == FrameControl::Continue {}
    }
}

fn check_edges(edges: &[LayoutEdge], node_count: usize) -> Result<()> {
    for edge in edges {
        for index in [edge.source, edge.target] {
            if index >= node_count {
                return Err(Error::NodeOutOfRange { index, node_count });
            }
        }
    }
    Ok(())
}

// ============================================================================
// Construction helpers
// ============================================================================

/// Build the node buffer for `codes`.
///
/// Each node starts at its entry in `positions`, or at `default` when it has
/// none; a node with neither is rejected. Mass comes from `degrees`.
pub fn build_layout_nodes(
    codes: &[String],
    positions: &HashMap<String, Position>,
    default: Option<Position>,
    degrees: &[usize],
) -> Result<Vec<LayoutNode>> {
    if degrees.len() != codes.len() {
        return Err(Error::invalid(format!(
            "{} degrees for {} nodes",
            degrees.len(),
            codes.len()
        )));
    }

    codes
        .iter()
        .zip(degrees)
        .map(|(code, &degree)| {
            let position = positions
                .get(code)
                .copied()
                .or(default)
                .ok_or_else(|| Error::MissingPosition { code: code.clone() })?;
            Ok(LayoutNode::new(position, degree))
        })
        .collect()
}

/// Attraction edges from the rendered edge list (normalized weights).
pub fn layout_edges(edges: &[GraphEdge]) -> Vec<LayoutEdge> {
    edges
        .iter()
        .map(|e| LayoutEdge {
            source: e.source,
            target: e.target,
            weight: e.normalized_weight,
        })
        .collect()
}

/// Place codes evenly on a circle around the viewport center.
pub fn circular_positions(codes: &[String], viewport: &Viewport) -> HashMap<String, Position> {
    let center = viewport.center();
    let radius = (viewport.width.min(viewport.height) / 2.0 - viewport.margin).max(0.0);
    let count = codes.len().max(1) as f64;

    codes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            let angle = i as f64 * 2.0 * PI / count;
            let position = Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            (code.clone(), position)
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::{build_edge_list, node_degrees};
    use crate::test_helpers::{codes, example_matrix, layout_edge, layout_nodes};

    fn two_node_session(total_frames: usize) -> LayoutSession {
        LayoutSession::new(
            layout_nodes(&[(400.0, 300.0), (600.0, 300.0)], &[1, 1]),
            vec![layout_edge(0, 1, 1.0)],
            LayoutConfig::default(),
            total_frames,
        )
        .unwrap()
    }

    // --- PublishPolicy ---

    #[test]
    fn test_publish_every_third_frame_and_last() {
        let policy = PublishPolicy::default();
        let published: Vec<usize> = (0..10).filter(|&f| policy.should_publish(f, 10)).collect();
        assert_eq!(published, vec![0, 3, 6, 9]);

        let published: Vec<usize> = (0..8).filter(|&f| policy.should_publish(f, 8)).collect();
        assert_eq!(published, vec![0, 3, 6, 7]);
    }

    #[test]
    fn test_publish_policy_rejects_zero() {
        assert!(PublishPolicy::every(0).is_err());
        assert_eq!(PublishPolicy::every(1).unwrap().every, 1);
    }

    // --- LayoutSession ---

    #[test]
    fn test_session_rejects_bad_input() {
        let nodes = layout_nodes(&[(0.0, 0.0)], &[0]);
        let err = LayoutSession::new(
            nodes.clone(),
            vec![layout_edge(0, 3, 1.0)],
            LayoutConfig::default(),
            10,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::NodeOutOfRange {
                index: 3,
                node_count: 1
            }
        );

        assert!(LayoutSession::new(nodes, vec![], LayoutConfig::default(), 0).is_err());
    }

    #[test]
    fn test_run_to_end_publishes_on_cadence() {
        let mut session = two_node_session(10);
        let mut sink: Vec<PositionSnapshot> = Vec::new();
        session.run_to_end(&mut sink);

        assert!(session.is_finished());
        assert_eq!(session.frame(), 10);
        let frames: Vec<usize> = sink.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 3, 6, 9]);
        assert!(sink.last().unwrap().finished);
        assert!(sink[..3].iter().all(|s| !s.finished));
        assert_eq!(sink.last().unwrap().positions, session.positions());
    }

    #[test]
    fn test_advance_after_finish_is_noop() {
        let mut session = two_node_session(2);
        let mut sink: Vec<PositionSnapshot> = Vec::new();
        assert_eq!(session.advance(&mut sink), FrameControl::Continue);
        assert_eq!(session.advance(&mut sink), FrameControl::Finished);

        let before = session.positions();
        assert_eq!(session.advance(&mut sink), FrameControl::Finished);
        assert_eq!(session.positions(), before);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_custom_publish_policy() {
        let mut session = two_node_session(5).with_publish_policy(PublishPolicy::every(1).unwrap());
        let mut sink: Vec<PositionSnapshot> = Vec::new();
        session.run_to_end(&mut sink);
        assert_eq!(sink.len(), 5);
    }

    #[test]
    fn test_drag_override_between_steps() {
        let mut session = two_node_session(10);
        let mut sink: Vec<PositionSnapshot> = Vec::new();
        session.advance(&mut sink);

        session
            .set_position(0, Position::new(200.0, 200.0))
            .unwrap();
        assert_eq!(session.positions()[0], Position::new(200.0, 200.0));
        assert_eq!(session.nodes()[0].old_dx, 0.0);

        session.run_to_end(&mut sink);
        for p in session.positions() {
            assert!(p.x.is_finite() && p.y.is_finite());
        }

        assert!(matches!(
            session.set_position(5, Position::default()),
            Err(Error::NodeOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_reset_restarts_with_fresh_data() {
        let mut session = two_node_session(4);
        session.run_to_end(&mut Vec::<PositionSnapshot>::new());
        assert!(session.is_finished());

        session
            .reset(
                layout_nodes(&[(100.0, 100.0), (200.0, 100.0), (300.0, 100.0)], &[0, 3, 0]),
                vec![],
            )
            .unwrap();
        assert_eq!(session.frame(), 0);
        assert!(!session.is_finished());
        assert_eq!(session.nodes().len(), 3);
        assert!((session.nodes()[1].mass() - 4.0).abs() < f64::EPSILON);

        assert!(session
            .reset(vec![], vec![layout_edge(0, 1, 1.0)])
            .is_err());
    }

    // --- Construction helpers ---

    #[test]
    fn test_build_layout_nodes_uses_positions_then_default() {
        let names = codes(&["A", "B"]);
        let positions = HashMap::from([("A".to_string(), Position::new(10.0, 20.0))]);

        let nodes =
            build_layout_nodes(&names, &positions, Some(Position::new(500.0, 300.0)), &[2, 0])
                .unwrap();
        assert_eq!(nodes[0].position(), Position::new(10.0, 20.0));
        assert_eq!(nodes[1].position(), Position::new(500.0, 300.0));
        assert!((nodes[0].mass() - 3.0).abs() < f64::EPSILON);

        let err = build_layout_nodes(&names, &positions, None, &[2, 0]).unwrap_err();
        assert_eq!(
            err,
            Error::MissingPosition {
                code: "B".to_string()
            }
        );

        assert!(build_layout_nodes(&names, &positions, None, &[1]).is_err());
    }

    #[test]
    fn test_layout_edges_use_normalized_weight() {
        let names = codes(&["A", "B", "C"]);
        let graph_edges = build_edge_list(&example_matrix(), &names, 0.005);
        let edges = layout_edges(&graph_edges);

        assert_eq!(edges.len(), 2);
        assert_eq!((edges[1].source, edges[1].target), (1, 2));
        assert!((edges[1].weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(node_degrees(&graph_edges, 3), vec![1, 2, 1]);
    }

    #[test]
    fn test_circular_positions_inside_margin() {
        let names = codes(&["A", "B", "C", "D"]);
        let viewport = Viewport::default();
        let positions = circular_positions(&names, &viewport);

        assert_eq!(positions.len(), 4);
        let a = positions["A"];
        assert!((a.x - 740.0).abs() < 1e-9 && (a.y - 300.0).abs() < 1e-9);
        for p in positions.values() {
            assert!((p.distance(&viewport.center()) - 240.0).abs() < 1e-9);
        }
    }
}
