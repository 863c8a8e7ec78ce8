//! Spillover Graph
//!
//! Analytics and layout core for a country-to-country spillover network:
//! - Symmetric adjacency from a directed spillover matrix
//! - Louvain community detection and Brandes betweenness centrality
//! - Thresholded, normalized edge lists for rendering
//! - A frame-driven ForceAtlas2 layout with pluggable scheduling

pub mod error;
pub mod graph;
pub mod layout;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{Error, Result};

use serde::Deserialize;
use std::path::Path;

use graph::models::AnalyticsConfig;
use layout::models::{LayoutConfig, Position};
use layout::scheduler::TokioFrameScheduler;
use layout::session::PublishPolicy;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub analytics: AnalyticsConfig,
    pub layout: LayoutConfig,
    pub simulation: SimulationYamlConfig,
}

/// Simulation driver section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationYamlConfig {
    pub total_frames: usize,
    pub publish_every: usize,
    pub frame_interval_ms: u64,
    /// Start position for nodes the caller supplies none for
    pub default_position: Option<Position>,
}

impl Default for SimulationYamlConfig {
    fn default() -> Self {
        Self {
            total_frames: 300,
            publish_every: 3,
            frame_interval_ms: 16,
            default_position: None,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub analytics: AnalyticsConfig,
    pub layout: LayoutConfig,
    pub total_frames: usize,
    pub publish_every: usize,
    pub frame_interval_ms: u64,
    pub default_position: Option<Position>,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let yaml = Self::load_yaml(yaml_path);

        // 2. Apply env var overrides
        let mut analytics = yaml.analytics;
        if let Some(w) = env_parse("SPILLOVER_MIN_EDGE_WEIGHT") {
            analytics.min_edge_weight = w;
        }

        let config = Self {
            analytics,
            layout: yaml.layout,
            total_frames: env_parse("SPILLOVER_TOTAL_FRAMES")
                .unwrap_or(yaml.simulation.total_frames),
            publish_every: env_parse("SPILLOVER_PUBLISH_EVERY")
                .unwrap_or(yaml.simulation.publish_every),
            frame_interval_ms: env_parse("SPILLOVER_FRAME_INTERVAL_MS")
                .unwrap_or(yaml.simulation.frame_interval_ms),
            default_position: yaml.simulation.default_position,
        };

        // 3. Reject values the simulation cannot run with
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if self.total_frames == 0 {
            return Err(Error::invalid("total_frames must be at least 1"));
        }
        if !(self.analytics.min_edge_weight.is_finite() && self.analytics.min_edge_weight >= 0.0) {
            return Err(Error::invalid(format!(
                "min_edge_weight must be a non-negative number, got {}",
                self.analytics.min_edge_weight
            )));
        }
        self.publish_policy().map(|_| ())
    }

    pub fn publish_policy(&self) -> Result<PublishPolicy> {
        PublishPolicy::every(self.publish_every)
    }

    pub fn scheduler(&self) -> TokioFrameScheduler {
        TokioFrameScheduler::from_millis(self.frame_interval_ms)
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
analytics:
  min_edge_weight: 0.01
  louvain_max_passes: 20

layout:
  scaling_ratio: 50
  lin_log_mode: false
  viewport:
    width: 1200
    height: 800

simulation:
  total_frames: 500
  publish_every: 5
  default_position:
    x: 500
    y: 300
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.analytics.min_edge_weight - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.analytics.louvain_max_passes, 20);
        // Unset fields keep their defaults
        assert!((config.analytics.centrality_threshold - 0.005).abs() < f64::EPSILON);
        assert!((config.layout.scaling_ratio - 50.0).abs() < f64::EPSILON);
        assert!(!config.layout.lin_log_mode);
        assert!((config.layout.viewport.width - 1200.0).abs() < f64::EPSILON);
        assert!((config.layout.viewport.margin - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.total_frames, 500);
        assert_eq!(config.simulation.publish_every, 5);
        assert_eq!(config.simulation.frame_interval_ms, 16);
        assert_eq!(
            config.simulation.default_position,
            Some(Position::new(500.0, 300.0))
        );
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.analytics.louvain_max_passes, 15);
        assert!((config.layout.gravity - 5.0).abs() < f64::EPSILON);
        assert!(config.layout.strong_gravity_mode);
        assert_eq!(config.simulation.total_frames, 300);
        assert_eq!(config.simulation.publish_every, 3);
        assert_eq!(config.simulation.frame_interval_ms, 16);
        assert!(config.simulation.default_position.is_none());
    }

    #[test]
    fn test_validate_rejects_unrunnable_values() {
        let base = Config {
            analytics: AnalyticsConfig::default(),
            layout: LayoutConfig::default(),
            total_frames: 300,
            publish_every: 3,
            frame_interval_ms: 16,
            default_position: None,
        };
        assert!(base.validate().is_ok());
        assert_eq!(base.scheduler().period().as_millis(), 16);

        let config = Config {
            total_frames: 0,
            ..base.clone()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));

        let config = Config {
            publish_every: 0,
            ..base.clone()
        };
        assert!(config.validate().is_err());

        let mut config = base;
        config.analytics.min_edge_weight = -1.0;
        assert!(config.validate().is_err());
    }

    /// Combined test for YAML file loading, env var overrides and fallbacks.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        // Helper to clear all config env vars
        fn clear_env() {
            for var in &[
                "SPILLOVER_TOTAL_FRAMES",
                "SPILLOVER_PUBLISH_EVERY",
                "SPILLOVER_FRAME_INTERVAL_MS",
                "SPILLOVER_MIN_EDGE_WEIGHT",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
analytics:
  min_edge_weight: 0.02
simulation:
  total_frames: 120
  publish_every: 4
  frame_interval_ms: 33
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.total_frames, 120);
        assert_eq!(config.publish_every, 4);
        assert_eq!(config.frame_interval_ms, 33);
        assert!((config.analytics.min_edge_weight - 0.02).abs() < f64::EPSILON);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("SPILLOVER_TOTAL_FRAMES", "60");
        std::env::set_var("SPILLOVER_MIN_EDGE_WEIGHT", "0.1");
        // Unparsable values are ignored
        std::env::set_var("SPILLOVER_PUBLISH_EVERY", "often");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.total_frames, 60);
        assert!((config.analytics.min_edge_weight - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.publish_every, 4);
        // YAML value still used where no env override
        assert_eq!(config.frame_interval_ms, 33);

        // --- Phase 3: Env override that makes the config unrunnable ---
        std::env::set_var("SPILLOVER_TOTAL_FRAMES", "0");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- Phase 4: Broken YAML → defaults ---
        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "simulation: [not, a, map").unwrap();
        let config = Config::from_yaml_and_env(Some(&broken)).unwrap();
        assert_eq!(config.total_frames, 300);

        // --- Phase 5: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-spillover-config-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.total_frames, 300);
        assert_eq!(config.publish_every, 3);
        assert!((config.analytics.min_edge_weight - 0.005).abs() < f64::EPSILON);
        assert!(config.default_position.is_none());
    }
}
