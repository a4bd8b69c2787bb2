//! Simulation controller: owns the full pipeline and its frame order.
//!
//! One `frame()` call runs root update -> physics step -> remesh, in
//! that order; nothing downstream reads a pass that has not finished.
//! A failed physics dispatch drops the frame: geometry is simply not
//! re-emitted, never partially written.

use anyhow::{Context, Result};
use glam::Mat4;
use meshing::StrandMesher;
use sim_core::{MeshingConfig, MotionTracker, SimulationConfig};
use skinning::{DeformTracker, SourceMesh};
use strands::{generate_tendrils, GeneratorParams, RootFrame, TendrilPool, TendrilStepper};

/// Per-frame report for logging and assertions.
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    /// Mean chain length relative to rest length (1.0 = no stretch).
    pub stretch: f32,
    /// True when the physics dispatch failed and geometry was skipped.
    pub dropped: bool,
}

/// Owns every piece of persistent simulation state and the tunable
/// configs; host-side parameter tweaks are ordinary setter calls on
/// this struct between frames.
pub struct Simulation {
    tracker: DeformTracker,
    pool: TendrilPool,
    stepper: TendrilStepper,
    mesher: StrandMesher,
    motion: MotionTracker,
    simulation: SimulationConfig,
    dropped_frames: u64,
}

impl Simulation {
    pub fn new(
        mesh: SourceMesh,
        simulation: SimulationConfig,
        meshing: MeshingConfig,
        generator: GeneratorParams,
    ) -> Result<Self> {
        simulation.validate().context("simulation config")?;
        meshing
            .validate(simulation.control_points_per_strand)
            .context("meshing config")?;

        let pool = generate_tendrils(&mesh.positions, &mesh.normals, &generator)
            .context("tendril generation")?;
        log::info!(
            "generated {} strands x {} control points from {} vertices",
            pool.len(),
            pool.control_points_per_strand(),
            mesh.positions.len()
        );

        let tracker = DeformTracker::new(mesh)
            .context("deform tracker setup")?
            .with_selection(pool.root_vertices().to_vec());
        let mesher = StrandMesher::new(
            pool.len() as u32,
            pool.control_points_per_strand(),
            meshing,
        )
        .context("mesher setup")?;
        log::info!(
            "geometry buffers: {} vertices, {} indices",
            mesher.sizes().total_points,
            mesher.sizes().total_indices
        );

        Ok(Self {
            tracker,
            pool,
            stepper: TendrilStepper::new(),
            mesher,
            motion: MotionTracker::new(),
            simulation,
            dropped_frames: 0,
        })
    }

    /// Run one full frame of the pipeline.
    pub fn frame(&mut self, world: Mat4, palette: &[Mat4], morph_influences: &[f32]) -> Result<FrameStats> {
        // The turbulence field rotates a little every frame.
        self.simulation.noise_offset += 0.01;

        let root_bone = palette.first().copied().unwrap_or(Mat4::IDENTITY);
        let motion = self.motion.advance(world, root_bone);

        self.tracker
            .update(palette, morph_influences)
            .context("root update")?;
        let roots = RootFrame {
            positions: self.tracker.positions(),
            normals: self.tracker.normals(),
        };

        let dropped = match self.stepper.step(&mut self.pool, &self.simulation, roots, &motion) {
            Ok(()) => {
                self.mesher.remesh(&self.pool);
                false
            }
            Err(e) => {
                log::warn!("physics dispatch failed ({e}), dropping frame");
                self.dropped_frames += 1;
                true
            }
        };

        Ok(FrameStats {
            stretch: self.mean_stretch(),
            dropped,
        })
    }

    /// Mutable access to the live tunables (stiffness, gravity, ...).
    /// Changes take effect on the next frame.
    pub fn simulation_mut(&mut self) -> &mut SimulationConfig {
        &mut self.simulation
    }

    /// Swap the meshing parameters; rebuilds the output buffers since
    /// their sizes are derived from the config.
    pub fn set_meshing(&mut self, meshing: MeshingConfig) -> Result<()> {
        self.mesher = StrandMesher::new(
            self.pool.len() as u32,
            self.pool.control_points_per_strand(),
            meshing,
        )
        .context("mesher rebuild")?;
        Ok(())
    }

    pub fn pool(&self) -> &TendrilPool {
        &self.pool
    }

    pub fn mesher(&self) -> &StrandMesher {
        &self.mesher
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    fn mean_stretch(&self) -> f32 {
        let n = self.pool.control_points_per_strand() as usize;
        let rest = self.simulation.segment_length * (n - 1) as f32;
        if self.pool.is_empty() || rest <= 0.0 {
            return 1.0;
        }
        let total: f32 = (0..self.pool.len())
            .map(|s| {
                self.pool
                    .strand(s)
                    .windows(2)
                    .map(|w| w[0].distance(w[1]))
                    .sum::<f32>()
            })
            .sum();
        total / (rest * self.pool.len() as f32)
    }
}
