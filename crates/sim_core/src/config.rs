//! Simulation and meshing parameters, plus output buffer sizing.
//!
//! Both parameter structs are plain values owned by the host controller
//! and passed into each frame's dispatch; UI-style tweaks are ordinary
//! field writes between frames. `validate()` runs once at setup and
//! rejects anything the per-frame path cannot handle; the stepper and
//! mesher assume validated inputs.

use glam::Vec3;

use crate::error::ConfigError;

/// Upper bound on control points in one strand's working set.
pub const MAX_CONTROL_POINTS_PER_STRAND: u32 = 64;

/// Upper bound on interpolated curve points per strand
/// (`(control_points - 1) * curve_samples`).
pub const MAX_CURVE_POINTS_PER_STRAND: u32 = 1024;

/// Global physics parameters, read by every strand every step.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Rest distance between adjacent control points.
    pub segment_length: f32,
    /// Pull-back toward the root-normal pose, 0 = limp, 1 = rigid.
    pub stiffness: f32,
    /// Drag multiplier; the parallel/perpendicular split is fixed.
    pub resistance: f32,
    /// Integration timestep in seconds.
    pub delta_time: f32,
    /// Constant gravity force.
    pub gravity: Vec3,
    /// Turbulence magnitude (scales the noise gradient).
    pub noise_strength: f32,
    /// Turbulence phase; the host advances this a little every frame.
    pub noise_offset: f32,
    /// Octaves accumulated in the turbulence field.
    pub noise_octaves: u32,
    /// Points per strand, including the root.
    pub control_points_per_strand: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            segment_length: 0.025,
            stiffness: 0.04,
            resistance: 1.53,
            delta_time: 0.016,
            gravity: Vec3::new(0.0, -9.8, 0.0),
            noise_strength: 5.0,
            noise_offset: 0.0,
            noise_octaves: 1,
            control_points_per_strand: 8,
        }
    }
}

impl SimulationConfig {
    /// Validate setup-time invariants. Call once before the first step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_points_per_strand < 2
            || self.control_points_per_strand > MAX_CONTROL_POINTS_PER_STRAND
        {
            return Err(ConfigError::ControlPointCount {
                got: self.control_points_per_strand,
                max: MAX_CONTROL_POINTS_PER_STRAND,
            });
        }
        for (name, v) in [
            ("segment_length", self.segment_length),
            ("delta_time", self.delta_time),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::NonPositiveScalar { name, got: v });
            }
        }
        if !(0.0..=1.0).contains(&self.stiffness) || !self.stiffness.is_finite() {
            return Err(ConfigError::StiffnessRange {
                got: self.stiffness,
            });
        }
        for (name, v) in [
            ("resistance", self.resistance),
            ("noise_strength", self.noise_strength),
            ("noise_offset", self.noise_offset),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name });
            }
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::NonFiniteParameter { name: "gravity" });
        }
        Ok(())
    }
}

/// Parameters for the tube-mesh extrusion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshingConfig {
    /// Hermite tangent magnitude (shape tuning, not a physical unit).
    pub tangent_scale: f32,
    /// Ring radius at the root; tapers linearly to zero at the tip.
    pub radius_falloff: f32,
    /// Interpolated curve points per chain segment.
    pub curve_samples: u32,
    /// Vertices per cross-section ring.
    pub cross_section_points: u32,
    /// Vertex color at the root end.
    pub color_root: [f32; 4],
    /// Vertex color at the tip end.
    pub color_tip: [f32; 4],
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            tangent_scale: 0.001,
            radius_falloff: 0.02,
            curve_samples: 1,
            cross_section_points: 4,
            // Light and dark sea green.
            color_root: [0.31, 0.68, 0.78, 1.0],
            color_tip: [0.29, 0.49, 0.54, 1.0],
        }
    }
}

impl MeshingConfig {
    /// Validate against a strand's control point count.
    pub fn validate(&self, control_points_per_strand: u32) -> Result<(), ConfigError> {
        if self.curve_samples == 0 {
            return Err(ConfigError::CurveSamples);
        }
        if self.cross_section_points < 3 {
            return Err(ConfigError::CrossSectionPoints {
                got: self.cross_section_points,
            });
        }
        let rings = (control_points_per_strand.saturating_sub(1))
            .checked_mul(self.curve_samples)
            .ok_or(ConfigError::BufferOverflow)?;
        if rings > MAX_CURVE_POINTS_PER_STRAND {
            return Err(ConfigError::CurvePointsPerStrand {
                got: rings,
                max: MAX_CURVE_POINTS_PER_STRAND,
            });
        }
        for (name, v) in [
            ("tangent_scale", self.tangent_scale),
            ("radius_falloff", self.radius_falloff),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::NonFiniteParameter { name });
            }
        }
        Ok(())
    }
}

/// Exact output geometry sizes, fixed at setup time.
///
/// Writes beyond these bounds are a correctness violation; the mesher
/// and its tests both derive their expectations from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    /// Interpolated rings along one strand.
    pub rings_per_strand: u32,
    /// Vertices emitted for one strand.
    pub points_per_strand: u32,
    /// Vertices across all strands.
    pub total_points: u32,
    /// Index slots across all strands (6 per ring-quad).
    pub total_indices: u32,
}

impl BufferSizes {
    /// Compute sizes for a pool of `strands` chains.
    pub fn compute(
        strands: u32,
        control_points_per_strand: u32,
        meshing: &MeshingConfig,
    ) -> Result<Self, ConfigError> {
        let segments = control_points_per_strand.saturating_sub(1);
        let rings_per_strand = segments
            .checked_mul(meshing.curve_samples)
            .ok_or(ConfigError::BufferOverflow)?;
        let points_per_strand = rings_per_strand
            .checked_mul(meshing.cross_section_points)
            .ok_or(ConfigError::BufferOverflow)?;
        let total_points = points_per_strand
            .checked_mul(strands)
            .ok_or(ConfigError::BufferOverflow)?;
        let total_indices = points_per_strand
            .checked_mul(6)
            .and_then(|n| n.checked_mul(strands))
            .ok_or(ConfigError::BufferOverflow)?;
        Ok(Self {
            rings_per_strand,
            points_per_strand,
            total_points,
            total_indices,
        })
    }

    /// Floats in the flat position buffer (xyz per vertex).
    pub fn vertex_floats(&self) -> usize {
        self.total_points as usize * 3
    }

    /// Floats in the flat color buffer (rgba per vertex).
    pub fn color_floats(&self) -> usize {
        self.total_points as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_simulation_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn control_point_bounds_rejected() {
        let mut config = SimulationConfig::default();
        config.control_points_per_strand = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ControlPointCount { got: 1, .. })
        ));
        config.control_points_per_strand = MAX_CONTROL_POINTS_PER_STRAND + 1;
        assert!(config.validate().is_err());
        config.control_points_per_strand = MAX_CONTROL_POINTS_PER_STRAND;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_scalars_rejected() {
        let mut config = SimulationConfig::default();
        config.delta_time = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.stiffness = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StiffnessRange { .. })
        ));

        let mut config = SimulationConfig::default();
        config.gravity = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn meshing_config_ring_limit() {
        let mut meshing = MeshingConfig::default();
        meshing.curve_samples = 100;
        // 63 segments * 100 samples = 6300 rings > 1024.
        assert!(matches!(
            meshing.validate(64),
            Err(ConfigError::CurvePointsPerStrand { .. })
        ));
        meshing.curve_samples = 16;
        assert!(meshing.validate(64).is_ok());
    }

    #[test]
    fn cross_section_minimum() {
        let mut meshing = MeshingConfig::default();
        meshing.cross_section_points = 2;
        assert!(matches!(
            meshing.validate(8),
            Err(ConfigError::CrossSectionPoints { got: 2 })
        ));
    }

    #[test]
    fn buffer_sizes_match_formula() {
        let meshing = MeshingConfig {
            curve_samples: 3,
            cross_section_points: 5,
            ..Default::default()
        };
        let sizes = BufferSizes::compute(10, 8, &meshing).unwrap();
        assert_eq!(sizes.rings_per_strand, 7 * 3);
        assert_eq!(sizes.points_per_strand, 7 * 3 * 5);
        assert_eq!(sizes.total_points, 7 * 3 * 5 * 10);
        assert_eq!(sizes.total_indices, 7 * 3 * 5 * 6 * 10);
        assert_eq!(sizes.vertex_floats(), sizes.total_points as usize * 3);
        assert_eq!(sizes.color_floats(), sizes.total_points as usize * 4);
    }
}
