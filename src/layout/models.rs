//! Layout simulation data models.
//!
//! - [`Position`] — a 2D point in viewport coordinates
//! - [`LayoutNode`] — per-node simulation state (position, forces, mass, speed)
//! - [`LayoutEdge`] — an attraction edge with a normalized weight
//! - [`LayoutConfig`] / [`Viewport`] — ForceAtlas2 tuning with documented defaults

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Geometry
// ============================================================================

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Drawing surface the layout is kept inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Distance from each edge where the soft bounds start pulling back
    pub margin: f64,
}

impl Viewport {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            margin: 60.0,
        }
    }
}

// ============================================================================
// Simulation state
// ============================================================================

/// One node of the force simulation.
///
/// `mass` is fixed at construction (`degree + 1`) for the lifetime of the
/// data snapshot; everything else is rewritten every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub x: f64,
    pub y: f64,
    /// Force accumulated in the current step
    pub dx: f64,
    pub dy: f64,
    /// Force accumulated in the previous step
    pub old_dx: f64,
    pub old_dy: f64,
    /// Adaptive per-node speed factor in [0, 1]; 0 when the node feels no force
    pub convergence: f64,
    mass: f64,
}

impl LayoutNode {
    pub fn new(position: Position, degree: usize) -> Self {
        Self {
            x: position.x,
            y: position.y,
            dx: 0.0,
            dy: 0.0,
            old_dx: 0.0,
            old_dy: 0.0,
            convergence: 1.0,
            mass: degree as f64 + 1.0,
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Attraction edge between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: usize,
    pub target: usize,
    /// Normalized edge weight (0.0–1.0)
    pub weight: f64,
}

// ============================================================================
// Configuration
// ============================================================================

/// ForceAtlas2 parameters.
///
/// Deserializes with `#[serde(default)]`, so a partial override (YAML or
/// JSON) is merged over these defaults field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Repulsion strength (default: 10.0)
    pub scaling_ratio: f64,
    /// Pull toward the viewport center (default: 5.0)
    pub gravity: f64,
    /// Exponent applied to edge weights in attraction (default: 1.0)
    pub edge_weight_influence: f64,
    /// Logarithmic attraction instead of linear (default: true)
    pub lin_log_mode: bool,
    /// Distance-independent gravity (default: true)
    pub strong_gravity_mode: bool,
    /// Divide attraction by the source node's mass (default: false)
    pub outbound_attraction_distribution: bool,
    /// Divisor on every node's speed (default: 1.0)
    pub slowing_ratio: f64,
    /// Tolerated oscillation before nodes slow down (default: 1.0)
    pub jitter_tolerance: f64,
    pub viewport: Viewport,
    /// Minimum center-to-center distance enforced after each step (default: 65.0)
    pub min_separation: f64,
    /// Overlap sweeps per step; sweeping stops early once no pair is too close (default: 50)
    pub max_overlap_sweeps: usize,
    /// Maximum per-node displacement per step (default: 10.0)
    pub max_displacement: f64,
    /// Upper clamp on the global speed (default: 10.0)
    pub max_global_speed: f64,
    /// Fraction of a bounds overflow pulled back per step (default: 0.6)
    pub bounds_pull: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            scaling_ratio: 10.0,
            gravity: 5.0,
            edge_weight_influence: 1.0,
            lin_log_mode: true,
            strong_gravity_mode: true,
            outbound_attraction_distribution: false,
            slowing_ratio: 1.0,
            jitter_tolerance: 1.0,
            viewport: Viewport::default(),
            min_separation: 65.0,
            max_overlap_sweeps: 50,
            max_displacement: 10.0,
            max_global_speed: 10.0,
            bounds_pull: 0.6,
        }
    }
}

impl LayoutConfig {
    /// Reject parameter values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.slowing_ratio > 0.0) {
            return Err(Error::invalid(format!(
                "slowing_ratio must be positive, got {}",
                self.slowing_ratio
            )));
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(Error::invalid(format!(
                "viewport must have a positive size, got {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }
        if !(0.0..=1.0).contains(&self.bounds_pull) {
            return Err(Error::invalid(format!(
                "bounds_pull must be within [0, 1], got {}",
                self.bounds_pull
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_config_defaults() {
        let config = LayoutConfig::default();
        assert!(config.lin_log_mode);
        assert!(config.strong_gravity_mode);
        assert!(!config.outbound_attraction_distribution);
        assert!((config.scaling_ratio - 10.0).abs() < f64::EPSILON);
        assert!((config.gravity - 5.0).abs() < f64::EPSILON);
        assert!((config.min_separation - 65.0).abs() < f64::EPSILON);
        assert_eq!(config.max_overlap_sweeps, 50);
        assert!((config.bounds_pull - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.viewport.center(), Position::new(500.0, 300.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_layout_config_partial_override_merges_defaults() {
        let yaml = r#"
gravity: 3.5
strong_gravity_mode: false
viewport:
  width: 800
"#;
        let config: LayoutConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.gravity - 3.5).abs() < f64::EPSILON);
        assert!(!config.strong_gravity_mode);
        assert!((config.scaling_ratio - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.max_overlap_sweeps, 50);
        assert!((config.viewport.width - 800.0).abs() < f64::EPSILON);
        assert!((config.viewport.height - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_layout_config_validate_rejects_bad_values() {
        let config = LayoutConfig {
            slowing_ratio: 0.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));

        let config = LayoutConfig {
            viewport: Viewport {
                width: -1.0,
                ..Viewport::default()
            },
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LayoutConfig {
            bounds_pull: 1.5,
            ..LayoutConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layout_node_mass_is_degree_plus_one() {
        let node = LayoutNode::new(Position::new(10.0, 20.0), 4);
        assert!((node.mass() - 5.0).abs() < f64::EPSILON);
        assert_eq!(node.position(), Position::new(10.0, 20.0));
        assert!((node.convergence - 1.0).abs() < f64::EPSILON);

        let isolated = LayoutNode::new(Position::default(), 0);
        assert!((isolated.mass() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < f64::EPSILON);
    }
}
