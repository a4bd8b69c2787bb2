//! Tube geometry emission from relaxed strand chains.

use glam::{Vec3, Vec4};
use rayon::prelude::*;
use sim_core::{smoothstep, BufferSizes, ConfigError, MeshingConfig};
use strands::TendrilPool;

use crate::hermite::{hermite_point, hermite_tangent};

/// Converts strand chains into tapered tube meshes.
///
/// Output buffers are allocated once at the exact sizes from
/// [`BufferSizes`] and rewritten in place each frame; every strand
/// writes only its own partition, so the dispatch runs in parallel.
#[derive(Debug)]
pub struct StrandMesher {
    strands: u32,
    control_points_per_strand: u32,
    config: MeshingConfig,
    sizes: BufferSizes,
    positions: Vec<f32>,
    colors: Vec<f32>,
    indices: Vec<u32>,
}

impl StrandMesher {
    /// Validate the meshing parameters and preallocate output buffers.
    pub fn new(
        strands: u32,
        control_points_per_strand: u32,
        config: MeshingConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(control_points_per_strand)?;
        let sizes = BufferSizes::compute(strands, control_points_per_strand, &config)?;
        Ok(Self {
            strands,
            control_points_per_strand,
            config,
            sizes,
            positions: vec![0.0; sizes.vertex_floats()],
            colors: vec![0.0; sizes.color_floats()],
            indices: vec![0; sizes.total_indices as usize],
        })
    }

    pub fn sizes(&self) -> BufferSizes {
        self.sizes
    }

    pub fn config(&self) -> &MeshingConfig {
        &self.config
    }

    /// Flat xyz vertex positions.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat rgba vertex colors.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Triangle indices into the vertex buffer.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Rebuild the whole geometry from the pool's current positions.
    pub fn remesh(&mut self, pool: &TendrilPool) {
        assert_eq!(pool.len() as u32, self.strands, "pool/mesher strand count");
        assert_eq!(
            pool.control_points_per_strand(),
            self.control_points_per_strand,
            "pool/mesher control point count"
        );

        let pps = self.sizes.points_per_strand as usize;
        let config = &self.config;
        let rings = self.sizes.rings_per_strand as usize;

        self.positions
            .par_chunks_mut(pps * 3)
            .zip(self.colors.par_chunks_mut(pps * 4))
            .zip(self.indices.par_chunks_mut(pps * 6))
            .enumerate()
            .for_each(|(strand, ((positions, colors), indices))| {
                mesh_strand(
                    pool.strand(strand),
                    pool.root_normal(strand),
                    (strand * pps) as u32,
                    rings,
                    config,
                    positions,
                    colors,
                    indices,
                );
            });
    }
}

/// Emit one strand's tube into its output partition.
#[allow(clippy::too_many_arguments)]
fn mesh_strand(
    chain: &[Vec3],
    root_normal: Vec3,
    vertex_base: u32,
    ring_count: usize,
    config: &MeshingConfig,
    positions: &mut [f32],
    colors: &mut [f32],
    indices: &mut [u32],
) {
    let n = chain.len();
    let samples = config.curve_samples as usize;
    let cross = config.cross_section_points as usize;

    // Control-point tangents: forward differences, backward at the tip.
    let mut tangents = vec![Vec3::Y; n];
    for i in 0..n {
        if i + 1 < n {
            tangents[i] = (chain[i + 1] - chain[i]).normalize_or(Vec3::Y);
        } else if i > 0 {
            tangents[i] = (chain[i] - chain[i - 1]).normalize_or(Vec3::Y);
        }
    }

    // Hermite resampling of the chain into the ring centers.
    let mut curve_points = Vec::with_capacity(ring_count);
    let mut curve_tangents = Vec::with_capacity(ring_count);
    for segment in 0..n - 1 {
        let p0 = chain[segment];
        let p1 = chain[segment + 1];
        let t0 = tangents[segment];
        let t1 = tangents[segment + 1];
        let chord = (p1 - p0).normalize_or(t0);
        for k in 0..samples {
            let t = k as f32 / samples as f32;
            curve_points.push(hermite_point(p0, p1, t0, t1, t, config.tangent_scale));
            curve_tangents.push(
                hermite_tangent(p0, p1, t0, t1, t, config.tangent_scale).normalize_or(chord),
            );
        }
    }

    // Initial cross-section frame from the root normal, nudged off the
    // tangent if the two are nearly aligned.
    let mut normal = root_normal;
    if normal.dot(curve_tangents[0]).abs() > 0.9 {
        normal = Vec3::X;
    }
    let mut binormal = curve_tangents[0].cross(normal).normalize_or(Vec3::Z);
    normal = binormal.cross(curve_tangents[0]).normalize_or(Vec3::X);

    let color_root = Vec4::from_array(config.color_root);
    let color_tip = Vec4::from_array(config.color_tip);
    let radius_denom = (ring_count.saturating_sub(1)).max(1) as f32;

    for ring in 0..ring_count {
        let center = curve_points[ring];
        let tangent = curve_tangents[ring];

        // Parallel transport: rotate the frame by whatever rotation
        // takes the previous tangent to the current one (Rodrigues),
        // instead of rebuilding it and picking up twist.
        if ring > 0 {
            let prev_tangent = curve_tangents[ring - 1];
            let axis = prev_tangent.cross(tangent);
            if axis.length() > 1e-5 {
                let axis = axis.normalize();
                let angle = prev_tangent.dot(tangent).clamp(-1.0, 1.0).acos();
                normal = rodrigues(normal, axis, angle);
                binormal = rodrigues(binormal, axis, angle);
            }
        }

        let radius = (1.0 - ring as f32 / radius_denom) * config.radius_falloff;
        let color = color_root.lerp(
            color_tip,
            smoothstep(0.0, ring_count as f32, ring as f32),
        );

        for j in 0..cross {
            let angle = std::f32::consts::TAU * j as f32 / cross as f32;
            let local = Vec3::new(angle.cos(), angle.sin(), 0.0) * radius;
            let world = binormal * local.x + normal * local.y + center;

            let vertex = ring * cross + j;
            positions[vertex * 3] = world.x;
            positions[vertex * 3 + 1] = world.y;
            positions[vertex * 3 + 2] = world.z;
            colors[vertex * 4..vertex * 4 + 4].copy_from_slice(&color.to_array());

            if ring > 0 {
                let a = vertex_base + ((ring - 1) * cross + j) as u32;
                let b = vertex_base + ((ring - 1) * cross + (j + 1) % cross) as u32;
                let c = vertex_base + (ring * cross + j) as u32;
                let d = vertex_base + (ring * cross + (j + 1) % cross) as u32;
                let slot = (ring - 1) * cross * 6 + j * 6;
                indices[slot..slot + 6].copy_from_slice(&[a, b, c, b, d, c]);
            }
        }
    }

    // The allocation reserves one quad block per ring but quads only
    // exist between rings; fill the trailing block with degenerate
    // triangles on the strand's own last vertex so every index slot is
    // written and stays inside this strand's vertex range.
    let last_vertex = vertex_base + (ring_count * cross) as u32 - 1;
    let tail = (ring_count - 1) * cross * 6;
    indices[tail..].fill(last_vertex);
}

/// Rodrigues' rotation of `v` around unit `axis` by `angle`.
#[inline]
fn rodrigues(v: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
}
