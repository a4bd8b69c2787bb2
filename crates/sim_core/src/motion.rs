//! Cross-frame motion tracking for the host mesh.
//!
//! When the host mesh translates or rotates between frames, strand
//! points carried over from the previous frame would read that motion
//! as velocity. The stepper cancels it by transforming every non-root
//! point so a point that merely rode along with the mesh keeps its
//! mesh-relative position exactly. The previous matrices live here,
//! updated at one defined point in the frame loop rather than captured
//! ad hoc.

use glam::Mat4;

/// Per-frame motion data consumed by the physics stepper.
#[derive(Debug, Clone, Copy)]
pub struct FrameMotion {
    /// Correction applied to carried-over strand points: maps a point
    /// from its previous-frame pose to where the host's rigid motion
    /// would have carried it, so the motion injects no velocity.
    pub inverse_delta: Mat4,
    /// Frame-to-frame transform of the root bone (debug readback).
    pub bone_delta: Mat4,
}

impl FrameMotion {
    /// Motion of a host that has not moved.
    pub fn identity() -> Self {
        Self {
            inverse_delta: Mat4::IDENTITY,
            bone_delta: Mat4::IDENTITY,
        }
    }
}

/// Persistent previous-frame transforms of the host mesh and its root bone.
#[derive(Debug)]
pub struct MotionTracker {
    previous_origin: Mat4,
    previous_bone: Mat4,
}

impl Default for MotionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionTracker {
    pub fn new() -> Self {
        Self {
            previous_origin: Mat4::IDENTITY,
            previous_bone: Mat4::IDENTITY,
        }
    }

    /// Consume this frame's transforms and produce the motion data for
    /// the dispatch. Must be called exactly once per frame.
    pub fn advance(&mut self, current_origin: Mat4, current_bone: Mat4) -> FrameMotion {
        let inverse_delta = current_origin * self.previous_origin.inverse();
        let bone_delta = current_bone * self.previous_bone.inverse();
        self.previous_origin = current_origin;
        self.previous_bone = current_bone;
        FrameMotion {
            inverse_delta,
            bone_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    #[test]
    fn stationary_host_yields_identity() {
        let mut tracker = MotionTracker::new();
        let world = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.7),
            Vec3::new(1.0, 2.0, 3.0),
        );
        tracker.advance(world, Mat4::IDENTITY);
        let motion = tracker.advance(world, Mat4::IDENTITY);
        let p = Vec3::new(0.3, -0.2, 0.9);
        assert!(motion.inverse_delta.transform_point3(p).distance(p) < 1e-5);
    }

    #[test]
    fn correction_carries_points_with_the_host() {
        let mut tracker = MotionTracker::new();
        let a = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let b = Mat4::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
            Vec3::new(1.0, 3.0, 0.0),
        );
        tracker.advance(a, Mat4::IDENTITY);
        let motion = tracker.advance(b, Mat4::IDENTITY);

        // A point riding on the host keeps its mesh-relative position:
        // the correction takes last frame's world pose to this frame's.
        let local = Vec3::new(0.5, 0.5, 0.5);
        let carried = motion.inverse_delta.transform_point3(a.transform_point3(local));
        assert!(carried.distance(b.transform_point3(local)) < 1e-4);
    }
}
