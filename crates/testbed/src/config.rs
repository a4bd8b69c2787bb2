//! Testbed configuration. Loaded from strandsim.ron at startup.

use serde::{Deserialize, Serialize};
use sim_core::{MeshingConfig, SimulationConfig};
use strands::{GeneratorParams, SamplingStrategy};

/// Host-side settings: scene shape, run length, and every tunable the
/// simulation exposes. Loaded from `strandsim.ron` in the current
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestbedConfig {
    /// Frames to simulate before exiting.
    #[serde(default = "default_frames")]
    pub frames: u32,
    /// Latitude rings of the demo sphere.
    #[serde(default = "default_sphere_rings")]
    pub sphere_rings: u32,
    /// Longitude segments of the demo sphere.
    #[serde(default = "default_sphere_segments")]
    pub sphere_segments: u32,
    /// Root-bone spin per frame, radians.
    #[serde(default = "default_bone_spin")]
    pub bone_spin: f32,

    /// Percentage of mesh vertices that may spawn strands.
    #[serde(default = "default_sample_percent")]
    pub sample_percent: f32,
    /// Vertices at or below this Y spawn nothing.
    #[serde(default = "default_y_threshold")]
    pub y_threshold: f32,
    /// Deterministic shuffle seed; None samples in index order.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    #[serde(default = "default_control_points")]
    pub control_points_per_strand: u32,
    #[serde(default = "default_segment_length")]
    pub segment_length: f32,
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,
    #[serde(default = "default_resistance")]
    pub resistance: f32,
    #[serde(default = "default_delta_time")]
    pub delta_time: f32,
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    #[serde(default = "default_noise_strength")]
    pub noise_strength: f32,
    #[serde(default = "default_noise_octaves")]
    pub noise_octaves: u32,

    #[serde(default = "default_tangent_scale")]
    pub tangent_scale: f32,
    #[serde(default = "default_radius_falloff")]
    pub radius_falloff: f32,
    #[serde(default = "default_curve_samples")]
    pub curve_samples: u32,
    #[serde(default = "default_cross_section_points")]
    pub cross_section_points: u32,
}

fn default_frames() -> u32 {
    300
}
fn default_sphere_rings() -> u32 {
    12
}
fn default_sphere_segments() -> u32 {
    16
}
fn default_bone_spin() -> f32 {
    0.01
}
fn default_sample_percent() -> f32 {
    100.0
}
fn default_y_threshold() -> f32 {
    -4.0
}
fn default_control_points() -> u32 {
    8
}
fn default_segment_length() -> f32 {
    0.025
}
fn default_stiffness() -> f32 {
    0.04
}
fn default_resistance() -> f32 {
    1.53
}
fn default_delta_time() -> f32 {
    0.016
}
fn default_gravity() -> [f32; 3] {
    [0.0, -9.8, 0.0]
}
fn default_noise_strength() -> f32 {
    5.0
}
fn default_noise_octaves() -> u32 {
    1
}
fn default_tangent_scale() -> f32 {
    0.001
}
fn default_radius_falloff() -> f32 {
    0.02
}
fn default_curve_samples() -> u32 {
    1
}
fn default_cross_section_points() -> u32 {
    4
}

impl Default for TestbedConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            sphere_rings: default_sphere_rings(),
            sphere_segments: default_sphere_segments(),
            bone_spin: default_bone_spin(),
            sample_percent: default_sample_percent(),
            y_threshold: default_y_threshold(),
            shuffle_seed: None,
            control_points_per_strand: default_control_points(),
            segment_length: default_segment_length(),
            stiffness: default_stiffness(),
            resistance: default_resistance(),
            delta_time: default_delta_time(),
            gravity: default_gravity(),
            noise_strength: default_noise_strength(),
            noise_octaves: default_noise_octaves(),
            tangent_scale: default_tangent_scale(),
            radius_falloff: default_radius_falloff(),
            curve_samples: default_curve_samples(),
            cross_section_points: default_cross_section_points(),
        }
    }
}

impl TestbedConfig {
    /// Load config from `strandsim.ron`. Missing or invalid files fall
    /// back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save current config to `strandsim.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            segment_length: self.segment_length,
            stiffness: self.stiffness,
            resistance: self.resistance,
            delta_time: self.delta_time,
            gravity: self.gravity.into(),
            noise_strength: self.noise_strength,
            noise_offset: 0.0,
            noise_octaves: self.noise_octaves,
            control_points_per_strand: self.control_points_per_strand,
        }
    }

    pub fn meshing(&self) -> MeshingConfig {
        MeshingConfig {
            tangent_scale: self.tangent_scale,
            radius_falloff: self.radius_falloff,
            curve_samples: self.curve_samples,
            cross_section_points: self.cross_section_points,
            ..Default::default()
        }
    }

    pub fn generator(&self) -> GeneratorParams {
        GeneratorParams {
            y_threshold: self.y_threshold,
            segment_length: self.segment_length,
            control_points_per_strand: self.control_points_per_strand,
            sample_percent: self.sample_percent,
            strategy: match self.shuffle_seed {
                Some(seed) => SamplingStrategy::Shuffled { seed },
                None => SamplingStrategy::IndexOrder,
            },
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("strandsim.ron")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_valid_configs() {
        let config = TestbedConfig::default();
        assert!(config.simulation().validate().is_ok());
        assert!(config
            .meshing()
            .validate(config.control_points_per_strand)
            .is_ok());
    }

    #[test]
    fn partial_ron_fills_in_defaults() {
        let config: TestbedConfig =
            ron::from_str("(frames: 10, stiffness: 0.5)").unwrap();
        assert_eq!(config.frames, 10);
        assert_eq!(config.stiffness, 0.5);
        assert_eq!(config.control_points_per_strand, 8);
    }
}
