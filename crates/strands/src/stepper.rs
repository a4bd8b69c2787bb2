//! Per-frame strand physics: verlet integration, constraint
//! relaxation, and the eased stiffness pull-back.
//!
//! Each strand is independent within a frame, so the pass runs as one
//! parallel dispatch over the pool with every strand writing only its
//! own slice. Ordering across passes (root update -> step -> meshing)
//! is the host controller's responsibility.

use glam::Vec3;
use rayon::prelude::*;
use sim_core::{ease_out_cubic, FrameMotion, SimulationConfig, StepError};

use crate::noise::PeriodicNoise;
use crate::pool::TendrilPool;

/// Drag coefficient along the strand direction.
const PARALLEL_DRAG: f32 = 120.1;
/// Drag coefficient orthogonal to the strand; the large ratio against
/// `PARALLEL_DRAG` is what makes strands swing like flexible rods.
const PERPENDICULAR_DRAG: f32 = 200.0;
/// Fixed relaxation iteration count. Constraints are not solved to
/// convergence; residual stretch is expected.
const CONSTRAINT_ITERATIONS: u32 = 50;
/// Below this separation a pair is considered degenerate and skipped.
const MIN_CONSTRAINT_DISTANCE: f32 = 1e-6;

/// Live root data for this frame, one entry per strand, produced by
/// the deform tracker.
#[derive(Debug, Clone, Copy)]
pub struct RootFrame<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
}

/// Advances every strand one simulation step.
#[derive(Debug, Default)]
pub struct TendrilStepper {
    noise: PeriodicNoise,
}

impl TendrilStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_noise(noise: PeriodicNoise) -> Self {
        Self { noise }
    }

    /// Run one frame over the whole pool.
    ///
    /// On `Err` the pool may hold non-finite points for the failing
    /// strands; the host must skip geometry emission for this frame
    /// (drop the frame, never partially apply it).
    pub fn step(
        &self,
        pool: &mut TendrilPool,
        config: &SimulationConfig,
        roots: RootFrame<'_>,
        motion: &FrameMotion,
    ) -> Result<(), StepError> {
        let n = pool.control_points_per_strand() as usize;
        let strands = pool.len();
        assert!(
            roots.positions.len() >= strands && roots.normals.len() >= strands,
            "root frame covers {} strands, pool has {}",
            roots.positions.len().min(roots.normals.len()),
            strands
        );

        let rotation = config.noise_offset.fract() * std::f32::consts::TAU;
        let noise = self.noise;

        // Keep the pool's root normals current; the mesher seeds its
        // cross-section frames from them.
        pool.root_normals.copy_from_slice(&roots.normals[..strands]);

        pool.positions
            .par_chunks_mut(n)
            .zip(pool.previous.par_chunks_mut(n))
            .enumerate()
            .map(|(strand, (current, previous))| {
                step_strand(
                    current,
                    previous,
                    roots.positions[strand],
                    roots.normals[strand],
                    config,
                    motion,
                    &noise,
                    rotation,
                );
                if current.iter().all(|p| p.is_finite()) {
                    Ok(())
                } else {
                    Err(StepError::NonFinite { strand })
                }
            })
            .reduce(|| Ok(()), |a, b| if a.is_err() { a } else { b })
    }
}

#[allow(clippy::too_many_arguments)]
fn step_strand(
    current: &mut [Vec3],
    previous: &mut [Vec3],
    root_position: Vec3,
    root_normal: Vec3,
    config: &SimulationConfig,
    motion: &FrameMotion,
    noise: &PeriodicNoise,
    rotation: f32,
) {
    let n = current.len();
    let dt2 = config.delta_time * config.delta_time;

    // Root injection: pin point 0 to the live surface, velocity zeroed.
    current[0] = root_position;
    previous[0] = root_position;

    // Cancel host motion: without this, a moving mesh injects its own
    // velocity into every carried-over point.
    for i in 1..n {
        current[i] = motion.inverse_delta.transform_point3(current[i]);
        previous[i] = motion.inverse_delta.transform_point3(previous[i]);
    }

    // Force accumulation + verlet integration.
    for i in 1..n {
        let position = current[i];
        let velocity = position - previous[i];

        let prev_neighbor = current[i - 1];
        let next_neighbor = if i + 1 < n { current[i + 1] } else { position };

        let mut force = config.gravity;

        if config.noise_strength != 0.0 {
            let sample = noise.sample_octaves(position, rotation, config.noise_octaves);
            force += sample.gradient.normalize_or_zero() * config.noise_strength;
        }

        // Anisotropic drag: cheap to slide along the strand, expensive
        // to sweep across it.
        let direction =
            ((next_neighbor - position) + (position - prev_neighbor)).normalize_or_zero();
        let parallel = direction * velocity.dot(direction);
        let perpendicular = velocity - parallel;
        force -=
            (parallel * PARALLEL_DRAG + perpendicular * PERPENDICULAR_DRAG) * config.resistance;

        previous[i] = position;
        current[i] = position + velocity + force * dt2;
    }

    // Distance-constraint relaxation, root end frozen.
    for _ in 0..CONSTRAINT_ITERATIONS {
        for i in 1..n {
            let delta = current[i] - current[i - 1];
            let distance = delta.length();
            if distance <= MIN_CONSTRAINT_DISTANCE {
                continue;
            }
            let correction = delta * ((distance - config.segment_length) / distance * 0.5);
            if i != 1 {
                current[i - 1] += correction;
            }
            current[i] -= correction;
        }
    }

    // Stiffness pull-back toward the straight root-normal pose,
    // strongest near the root and fading toward the tip. Previous
    // positions follow so the blend does not read as velocity.
    if config.stiffness > 0.0 {
        let root = current[0];
        for i in 1..n {
            let natural = root + root_normal * (config.segment_length * i as f32);
            let falloff = ease_out_cubic(1.0 - i as f32 / n as f32);
            let influence = (config.stiffness * falloff).clamp(0.0, 1.0);
            current[i] = current[i].lerp(natural, influence);
            previous[i] = previous[i].lerp(natural, influence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate_tendrils, GeneratorParams};
    use glam::{Mat4, Quat};
    use sim_core::MotionTracker;

    fn quiet_config(n: u32, segment_length: f32) -> SimulationConfig {
        SimulationConfig {
            segment_length,
            stiffness: 0.0,
            resistance: 0.0,
            delta_time: 0.016,
            gravity: Vec3::ZERO,
            noise_strength: 0.0,
            noise_offset: 0.0,
            noise_octaves: 1,
            control_points_per_strand: n,
        }
    }

    fn single_strand(n: u32, segment_length: f32) -> TendrilPool {
        let params = GeneratorParams {
            segment_length,
            control_points_per_strand: n,
            ..Default::default()
        };
        generate_tendrils(&[Vec3::ZERO], &[Vec3::Y], &params).unwrap()
    }

    fn chain_length(strand: &[Vec3]) -> f32 {
        strand.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    #[test]
    fn rest_length_convergence_from_perturbed_start() {
        let seg = 0.025;
        let mut pool = single_strand(8, seg);
        // Bounded perturbation of every non-root point, zero velocity.
        for i in 1..8 {
            let offset = Vec3::new(
                (i as f32 * 0.77).sin() * 0.01,
                (i as f32 * 1.31).cos() * 0.01,
                (i as f32 * 0.53).sin() * 0.01,
            );
            pool.positions[i] += offset;
            pool.previous[i] = pool.positions[i];
        }
        let config = quiet_config(8, seg);
        let stepper = TendrilStepper::new();
        let roots = ([Vec3::ZERO], [Vec3::Y]);
        stepper
            .step(
                &mut pool,
                &config,
                RootFrame {
                    positions: &roots.0,
                    normals: &roots.1,
                },
                &FrameMotion::identity(),
            )
            .unwrap();
        for pair in pool.strand(0).windows(2) {
            let d = pair[0].distance(pair[1]);
            assert!(
                (d - seg).abs() < seg * 0.01,
                "pair distance {d} vs rest {seg}"
            );
        }
    }

    #[test]
    fn root_is_pinned_exactly_every_frame() {
        let mut pool = single_strand(8, 0.025);
        let mut config = quiet_config(8, 0.025);
        config.gravity = Vec3::new(0.0, -9.8, 0.0);
        config.noise_strength = 2.0;
        config.resistance = 1.0;
        let stepper = TendrilStepper::new();
        for frame in 0..20 {
            let root = Vec3::new((frame as f32 * 0.1).sin(), 0.2, 0.0);
            let roots = ([root], [Vec3::Y]);
            stepper
                .step(
                    &mut pool,
                    &config,
                    RootFrame {
                        positions: &roots.0,
                        normals: &roots.1,
                    },
                    &FrameMotion::identity(),
                )
                .unwrap();
            assert_eq!(pool.strand(0)[0], root);
        }
    }

    #[test]
    fn full_stiffness_recovers_natural_pose() {
        let seg = 0.025;
        let mut pool = single_strand(8, seg);
        let mut config = quiet_config(8, seg);
        config.stiffness = 1.0;
        config.gravity = Vec3::new(0.0, -9.8, 0.0);
        config.delta_time = 0.005;
        let stepper = TendrilStepper::new();
        let roots = ([Vec3::ZERO], [Vec3::Y]);
        for _ in 0..200 {
            stepper
                .step(
                    &mut pool,
                    &config,
                    RootFrame {
                        positions: &roots.0,
                        normals: &roots.1,
                    },
                    &FrameMotion::identity(),
                )
                .unwrap();
        }
        for (i, p) in pool.strand(0).iter().enumerate() {
            let natural = Vec3::Y * (seg * i as f32);
            assert!(
                p.distance(natural) < seg * 0.15,
                "point {i} at {p:?} strayed from natural {natural:?}"
            );
        }
    }

    #[test]
    fn rigid_host_motion_leaves_local_shape_unchanged() {
        let seg = 0.05;
        let mut pool = single_strand(6, seg);
        let config = quiet_config(6, seg);
        let stepper = TendrilStepper::new();
        let mut tracker = MotionTracker::new();
        let root_local = Vec3::ZERO;
        let initial: Vec<Vec3> = pool.strand(0).to_vec();

        // Prime the tracker at identity.
        tracker.advance(Mat4::IDENTITY, Mat4::IDENTITY);

        let mut world = Mat4::IDENTITY;
        for frame in 1..=10 {
            world = Mat4::from_rotation_translation(
                Quat::from_rotation_y(frame as f32 * 0.2),
                Vec3::new(frame as f32 * 0.3, 0.0, frame as f32 * -0.1),
            );
            let motion = tracker.advance(world, Mat4::IDENTITY);
            let root = world.transform_point3(root_local);
            let roots = ([root], [world.transform_vector3(Vec3::Y)]);
            stepper
                .step(
                    &mut pool,
                    &config,
                    RootFrame {
                        positions: &roots.0,
                        normals: &roots.1,
                    },
                    &motion,
                )
                .unwrap();
        }

        let inverse_world = world.inverse();
        for (i, p) in pool.strand(0).iter().enumerate() {
            let local = inverse_world.transform_point3(*p);
            assert!(
                local.distance(initial[i]) < 1e-2,
                "point {i}: local {local:?} vs initial {:?}",
                initial[i]
            );
        }
    }

    #[test]
    fn tip_falls_and_chain_length_holds() {
        // Gravity-only dangle: a chain sticking out horizontally must
        // swing down within 100 frames while staying near rest length.
        let seg = 0.025;
        let params = GeneratorParams {
            segment_length: seg,
            control_points_per_strand: 8,
            ..Default::default()
        };
        let mut pool = generate_tendrils(&[Vec3::ZERO], &[Vec3::X], &params).unwrap();
        let mut config = quiet_config(8, seg);
        config.gravity = Vec3::new(0.0, -9.8, 0.0);
        let stepper = TendrilStepper::new();
        let initial_tip_y = pool.strand(0)[7].y;
        let roots = ([Vec3::ZERO], [Vec3::X]);
        let mut lowest_tip_y = initial_tip_y;
        for _ in 0..100 {
            stepper
                .step(
                    &mut pool,
                    &config,
                    RootFrame {
                        positions: &roots.0,
                        normals: &roots.1,
                    },
                    &FrameMotion::identity(),
                )
                .unwrap();
            lowest_tip_y = lowest_tip_y.min(pool.strand(0)[7].y);
        }
        let strand = pool.strand(0);
        assert!(strand[7].y < initial_tip_y, "tip should have fallen");
        // The swing carried the tip well below the root at some point.
        assert!(lowest_tip_y < -3.0 * seg, "lowest tip {lowest_tip_y}");
        let rest = 7.0 * seg;
        let length = chain_length(strand);
        assert!(
            (length - rest).abs() < rest * 0.05,
            "chain length {length} vs rest {rest}"
        );
    }

    #[test]
    fn non_finite_positions_fail_the_dispatch() {
        let mut pool = single_strand(8, 0.025);
        pool.positions[3] = Vec3::splat(f32::NAN);
        pool.previous[3] = Vec3::splat(f32::NAN);
        let config = quiet_config(8, 0.025);
        let stepper = TendrilStepper::new();
        let roots = ([Vec3::ZERO], [Vec3::Y]);
        let result = stepper.step(
            &mut pool,
            &config,
            RootFrame {
                positions: &roots.0,
                normals: &roots.1,
            },
            &FrameMotion::identity(),
        );
        assert_eq!(result, Err(StepError::NonFinite { strand: 0 }));
    }

    #[test]
    fn coincident_points_do_not_produce_nan() {
        // All points collapsed onto the root: every pair is degenerate,
        // corrections must be skipped rather than divide by zero.
        let mut pool = single_strand(4, 0.025);
        for i in 0..4 {
            pool.positions[i] = Vec3::ZERO;
            pool.previous[i] = Vec3::ZERO;
        }
        let config = quiet_config(4, 0.025);
        let stepper = TendrilStepper::new();
        let roots = ([Vec3::ZERO], [Vec3::Y]);
        stepper
            .step(
                &mut pool,
                &config,
                RootFrame {
                    positions: &roots.0,
                    normals: &roots.1,
                },
                &FrameMotion::identity(),
            )
            .unwrap();
        assert!(pool.strand(0).iter().all(|p| p.is_finite()));
    }
}
