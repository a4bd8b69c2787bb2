//! strandsim testbed: headless frame loop over the full pipeline
//! (root tracking -> strand physics -> tube meshing), with stats.

mod config;
mod harness;
mod scene;

use anyhow::Result;
use config::TestbedConfig;
use harness::Simulation;
use sim_core::{MeshingConfig, Time};

fn main() -> Result<()> {
    env_logger::init();

    let config = TestbedConfig::load();
    if !std::path::Path::new("strandsim.ron").exists() {
        config.save();
    }
    log::info!(
        "strandsim testbed: {} frames, sphere {}x{}",
        config.frames,
        config.sphere_rings,
        config.sphere_segments
    );

    let mesh = scene::demo_sphere(config.sphere_rings, config.sphere_segments, 0.6);
    let mut sim = Simulation::new(
        mesh,
        config.simulation(),
        config.meshing(),
        config.generator(),
    )?;

    let mut time = Time::new();
    let mut worst_stretch: f32 = 1.0;
    for frame in 0..config.frames {
        time.update();

        // Exercise the live tunables the way a host UI would.
        if frame == config.frames / 2 {
            log::info!("halfway: calming turbulence");
            sim.simulation_mut().noise_strength *= 0.25;
        }
        if frame == config.frames * 3 / 4 {
            log::info!("three quarters: doubling cross-section resolution");
            sim.set_meshing(MeshingConfig {
                cross_section_points: config.cross_section_points * 2,
                ..config.meshing()
            })?;
        }

        let stats = sim.frame(
            scene::host_world(frame),
            &scene::bone_palette(frame, config.bone_spin),
            &[],
        )?;
        worst_stretch = worst_stretch.max(stats.stretch);
        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: stretch {:.3}{}",
                stats.stretch,
                if stats.dropped { " (dropped)" } else { "" }
            );
        }
    }

    let sizes = sim.mesher().sizes();
    log::info!(
        "done in {:.2}s: {} strands, {} vertices, {} indices, worst stretch {:.3}, {} dropped frames",
        time.elapsed_seconds(),
        sim.pool().len(),
        sizes.total_points,
        sizes.total_indices,
        worst_stretch,
        sim.dropped_frames()
    );
    Ok(())
}
