//! Fixed pool of simulated strands.
//!
//! Storage is flat and strand-major: strand `s` owns points
//! `s * n .. (s + 1) * n` of both position buffers. The pool is built
//! once by the generator and lives for the whole simulation; roots are
//! re-pinned every frame but strands are never added or removed.

use glam::Vec3;

/// Current and previous control point positions for every strand, plus
/// per-strand root normals.
#[derive(Debug, Clone)]
pub struct TendrilPool {
    control_points_per_strand: u32,
    pub(crate) positions: Vec<Vec3>,
    pub(crate) previous: Vec<Vec3>,
    pub(crate) root_normals: Vec<Vec3>,
    root_vertices: Vec<u32>,
}

impl TendrilPool {
    /// Assemble a pool from generator output. `positions` and
    /// `previous` are strand-major flat buffers of equal length;
    /// `root_vertices` records the source-mesh vertex each strand is
    /// pinned to.
    pub fn from_parts(
        control_points_per_strand: u32,
        positions: Vec<Vec3>,
        previous: Vec<Vec3>,
        root_normals: Vec<Vec3>,
        root_vertices: Vec<u32>,
    ) -> Self {
        let n = control_points_per_strand as usize;
        debug_assert_eq!(positions.len(), previous.len());
        debug_assert_eq!(positions.len(), root_normals.len() * n);
        debug_assert_eq!(root_normals.len(), root_vertices.len());
        Self {
            control_points_per_strand,
            positions,
            previous,
            root_normals,
            root_vertices,
        }
    }

    /// Number of active strands.
    pub fn len(&self) -> usize {
        self.root_normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root_normals.is_empty()
    }

    pub fn control_points_per_strand(&self) -> u32 {
        self.control_points_per_strand
    }

    /// Control points of one strand.
    pub fn strand(&self, index: usize) -> &[Vec3] {
        let n = self.control_points_per_strand as usize;
        &self.positions[index * n..(index + 1) * n]
    }

    /// Previous-frame control points of one strand.
    pub fn previous_strand(&self, index: usize) -> &[Vec3] {
        let n = self.control_points_per_strand as usize;
        &self.previous[index * n..(index + 1) * n]
    }

    /// Root normal for a strand: recorded at generation time, then
    /// refreshed from the live tracked normals on every physics step.
    pub fn root_normal(&self, index: usize) -> Vec3 {
        self.root_normals[index]
    }

    pub fn root_normals(&self) -> &[Vec3] {
        &self.root_normals
    }

    /// Source-mesh vertex index each strand is rooted at, in strand
    /// order. The host hands this to the deform tracker as its
    /// selection so tracked roots line up with strand slots.
    pub fn root_vertices(&self) -> &[u32] {
        &self.root_vertices
    }

    /// Flat xyz view of current positions, for host debug readback.
    pub fn positions_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Flat xyz view of previous positions.
    pub fn previous_f32(&self) -> &[f32] {
        bytemuck::cast_slice(&self.previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_slices_are_strand_major() {
        let positions: Vec<Vec3> = (0..6).map(|i| Vec3::splat(i as f32)).collect();
        let pool = TendrilPool::from_parts(
            3,
            positions.clone(),
            positions,
            vec![Vec3::Y, Vec3::Y],
            vec![0, 1],
        );
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.strand(1)[0], Vec3::splat(3.0));
        assert_eq!(pool.strand(1).len(), 3);
    }

    #[test]
    fn flat_view_matches_layout() {
        let positions = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)];
        let pool =
            TendrilPool::from_parts(2, positions.clone(), positions, vec![Vec3::Y], vec![0]);
        assert_eq!(pool.positions_f32(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
