//! Initial tendril placement from a source mesh's vertices.

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sim_core::{ConfigError, MAX_CONTROL_POINTS_PER_STRAND};

use crate::pool::TendrilPool;

/// Which vertices get sampled when `sample_percent < 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Walk vertices in buffer order and take the first slice. Biased
    /// toward whatever region the mesh author emitted first, but
    /// reproducible with no seed.
    IndexOrder,
    /// Deterministic shuffle of the vertex indices before sampling.
    Shuffled { seed: u64 },
}

/// Parameters for tendril generation.
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    /// Vertices at or below this world Y never spawn a strand.
    pub y_threshold: f32,
    /// Spacing of the straight initial pose.
    pub segment_length: f32,
    /// Points per strand, including the root.
    pub control_points_per_strand: u32,
    /// Percentage of mesh vertices considered (0..=100).
    pub sample_percent: f32,
    pub strategy: SamplingStrategy,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            y_threshold: f32::NEG_INFINITY,
            segment_length: 0.025,
            control_points_per_strand: 8,
            sample_percent: 100.0,
            strategy: SamplingStrategy::IndexOrder,
        }
    }
}

/// Build the initial tendril pool from mesh vertex data.
///
/// Pure function of its inputs: samples `sample_percent` of the
/// vertices in strategy order, keeps those above `y_threshold`, and
/// lays each strand's control points straight along the root normal at
/// `segment_length` spacing with zero initial velocity. A vertex with
/// no supplied normal gets the direction from the mesh-local origin to
/// the vertex (accurate for star-convex meshes only).
pub fn generate_tendrils(
    positions: &[Vec3],
    normals: &[Vec3],
    params: &GeneratorParams,
) -> Result<TendrilPool, ConfigError> {
    let n = params.control_points_per_strand;
    if !(2..=MAX_CONTROL_POINTS_PER_STRAND).contains(&n) {
        return Err(ConfigError::ControlPointCount {
            got: n,
            max: MAX_CONTROL_POINTS_PER_STRAND,
        });
    }
    if !(params.segment_length.is_finite() && params.segment_length > 0.0) {
        return Err(ConfigError::NonPositiveScalar {
            name: "segment_length",
            got: params.segment_length,
        });
    }

    let percent = params.sample_percent.clamp(0.0, 100.0);
    let sample_count = ((percent / 100.0) * positions.len() as f32).floor() as usize;

    let mut order: Vec<u32> = (0..positions.len() as u32).collect();
    if let SamplingStrategy::Shuffled { seed } = params.strategy {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }

    let mut pool_positions = Vec::new();
    let mut root_normals = Vec::new();
    let mut root_vertices = Vec::new();

    for &vertex in order.iter().take(sample_count) {
        let root = positions[vertex as usize];
        if root.y <= params.y_threshold {
            continue;
        }
        let normal = match normals.get(vertex as usize) {
            Some(n) => *n,
            None => root.normalize_or_zero(),
        };
        for j in 0..n {
            pool_positions.push(root + normal * (params.segment_length * j as f32));
        }
        root_normals.push(normal);
        root_vertices.push(vertex);
    }

    log::debug!(
        "sampled {} of {} vertices, {} strands pass the threshold",
        sample_count,
        positions.len(),
        root_normals.len()
    );

    let previous = pool_positions.clone();
    Ok(TendrilPool::from_parts(
        n,
        pool_positions,
        previous,
        root_normals,
        root_vertices,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(count: usize) -> Vec<Vec3> {
        (0..count).map(|i| Vec3::new(0.0, i as f32, 0.0)).collect()
    }

    #[test]
    fn threshold_filters_low_vertices() {
        let positions = column(6);
        let normals = vec![Vec3::Y; 6];
        let params = GeneratorParams {
            y_threshold: 2.5,
            ..Default::default()
        };
        let pool = generate_tendrils(&positions, &normals, &params).unwrap();
        // Only y = 3, 4, 5 pass.
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.root_vertices(), &[3, 4, 5]);
    }

    #[test]
    fn percentage_takes_leading_slice_in_index_order() {
        let positions = column(10);
        let normals = vec![Vec3::Y; 10];
        let params = GeneratorParams {
            sample_percent: 50.0,
            ..Default::default()
        };
        let pool = generate_tendrils(&positions, &normals, &params).unwrap();
        assert_eq!(pool.len(), 5);
        // Index order: roots are the first five vertices.
        assert_eq!(pool.strand(4)[0], Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn straight_initial_pose_with_zero_velocity() {
        let positions = vec![Vec3::new(1.0, 1.0, 0.0)];
        let normals = vec![Vec3::X];
        let params = GeneratorParams {
            segment_length: 0.5,
            control_points_per_strand: 4,
            ..Default::default()
        };
        let pool = generate_tendrils(&positions, &normals, &params).unwrap();
        let strand = pool.strand(0);
        for (j, p) in strand.iter().enumerate() {
            let expected = Vec3::new(1.0 + 0.5 * j as f32, 1.0, 0.0);
            assert!(p.distance(expected) < 1e-6);
        }
        assert_eq!(pool.strand(0), pool.previous_strand(0));
    }

    #[test]
    fn missing_normals_fall_back_to_centroid_direction() {
        let positions = vec![Vec3::new(0.0, 2.0, 0.0)];
        let pool = generate_tendrils(&positions, &[], &GeneratorParams::default()).unwrap();
        assert!(pool.root_normal(0).distance(Vec3::Y) < 1e-6);
    }

    #[test]
    fn shuffled_sampling_is_deterministic_per_seed() {
        let positions = column(20);
        let normals = vec![Vec3::Y; 20];
        let params = GeneratorParams {
            sample_percent: 25.0,
            strategy: SamplingStrategy::Shuffled { seed: 7 },
            ..Default::default()
        };
        let a = generate_tendrils(&positions, &normals, &params).unwrap();
        let b = generate_tendrils(&positions, &normals, &params).unwrap();
        assert_eq!(a.len(), b.len());
        for s in 0..a.len() {
            assert_eq!(a.strand(s)[0], b.strand(s)[0]);
        }
    }

    #[test]
    fn control_point_bound_enforced() {
        let params = GeneratorParams {
            control_points_per_strand: 65,
            ..Default::default()
        };
        assert!(matches!(
            generate_tendrils(&column(1), &[], &params),
            Err(ConfigError::ControlPointCount { got: 65, .. })
        ));
    }
}
