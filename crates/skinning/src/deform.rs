//! Per-frame vertex deformation: blended bone matrices + morph targets.

use glam::{Mat4, Vec3};
use rayon::prelude::*;
use sim_core::ConfigError;

use crate::mesh::{SkinData, SourceMesh};

/// The closed set of deform pipelines, fixed at construction from the
/// mesh's actual data. No per-frame feature branching beyond this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeformVariant {
    /// No skin, no morphs: base geometry passes through unchanged.
    Rigid,
    /// Bone-weighted skinning only.
    Skinned,
    /// Skinning plus morph-target displacement.
    SkinnedMorph,
}

/// Tracks the deformed world-space position and normal of a source
/// mesh's vertices, recomputed once per frame.
///
/// With a selection set, only the chosen vertices are evaluated and
/// stored, in selection order; the usual case is tracking just the
/// strand roots instead of the whole mesh.
#[derive(Debug)]
pub struct DeformTracker {
    mesh: SourceMesh,
    variant: DeformVariant,
    /// Minimum palette length implied by the skin's bone indices.
    required_palette_len: usize,
    /// Vertex subset to evaluate; None means every vertex.
    selection: Option<Vec<u32>>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl DeformTracker {
    /// Validate the mesh and build a tracker over all of its vertices.
    pub fn new(mesh: SourceMesh) -> Result<Self, ConfigError> {
        mesh.validate()?;
        let variant = match (&mesh.skin, mesh.morphs.is_empty()) {
            (None, true) => DeformVariant::Rigid,
            (Some(_), true) => DeformVariant::Skinned,
            (_, false) => DeformVariant::SkinnedMorph,
        };
        let required_palette_len = mesh
            .skin
            .as_ref()
            .map(|s| s.max_bone_index() + 1)
            .unwrap_or(0);
        let count = mesh.vertex_count();
        let positions = mesh.positions.clone();
        let normals = (0..count).map(|i| mesh.normal(i)).collect();
        Ok(Self {
            mesh,
            variant,
            required_palette_len,
            selection: None,
            positions,
            normals,
        })
    }

    /// Restrict evaluation and storage to a vertex subset.
    pub fn with_selection(mut self, indices: Vec<u32>) -> Self {
        self.positions = indices
            .iter()
            .map(|&i| self.mesh.positions[i as usize])
            .collect();
        self.normals = indices
            .iter()
            .map(|&i| self.mesh.normal(i as usize))
            .collect();
        self.selection = Some(indices);
        self
    }

    pub fn variant(&self) -> DeformVariant {
        self.variant
    }

    pub fn mesh(&self) -> &SourceMesh {
        &self.mesh
    }

    /// Deformed positions, in selection order when a selection is set.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Deformed normals, matching `positions` ordering.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Recompute tracked vertices from this frame's bone palette and
    /// morph influences. Influences beyond the mesh's morph count are
    /// ignored; missing ones read as zero.
    pub fn update(&mut self, palette: &[Mat4], morph_influences: &[f32]) -> Result<(), ConfigError> {
        if self.mesh.skin.is_some() && palette.len() < self.required_palette_len {
            return Err(ConfigError::PaletteTooSmall {
                got: palette.len(),
                required: self.required_palette_len,
            });
        }

        let mesh = &self.mesh;
        let selection = self.selection.as_deref();
        self.positions
            .par_iter_mut()
            .zip(self.normals.par_iter_mut())
            .enumerate()
            .for_each(|(slot, (out_pos, out_normal))| {
                let index = match selection {
                    Some(indices) => indices[slot] as usize,
                    None => slot,
                };
                let (p, n) = deform_vertex(mesh, index, palette, morph_influences);
                *out_pos = p;
                *out_normal = n;
            });
        Ok(())
    }
}

/// Evaluate one vertex: morph displacement on the base position, then
/// the blended bone matrix on position and normal.
fn deform_vertex(
    mesh: &SourceMesh,
    index: usize,
    palette: &[Mat4],
    morph_influences: &[f32],
) -> (Vec3, Vec3) {
    let base = mesh.positions[index];
    let base_normal = mesh.normal(index);

    let mut position = base;
    for (morph, &influence) in mesh.morphs.iter().zip(morph_influences) {
        if influence != 0.0 {
            position += (morph.positions[index] - base) * influence;
        }
    }

    let world = match &mesh.skin {
        Some(skin) => blended_matrix(skin, index, palette),
        None => Mat4::IDENTITY,
    };

    let world_pos = world.transform_point3(position);
    let rotation = glam::Mat3::from_mat4(world);
    let world_normal = (rotation * base_normal).normalize_or_zero();
    (world_pos, world_normal)
}

/// Weighted sum of palette matrices over up to eight influence slots.
fn blended_matrix(skin: &SkinData, index: usize, palette: &[Mat4]) -> Mat4 {
    let mut influence = Mat4::ZERO;
    let mut total = 0.0;
    let indices = skin.indices[index];
    let weights = skin.weights[index];
    for slot in 0..4 {
        let w = weights[slot];
        if w != 0.0 {
            influence += palette[indices[slot] as usize] * w;
            total += w;
        }
    }
    if !skin.indices_extra.is_empty() {
        let indices = skin.indices_extra[index];
        let weights = skin.weights_extra[index];
        for slot in 0..4 {
            let w = weights[slot];
            if w != 0.0 {
                influence += palette[indices[slot] as usize] * w;
                total += w;
            }
        }
    }
    // Unweighted vertices ride the mesh rigidly.
    if total == 0.0 {
        Mat4::IDENTITY
    } else {
        influence
    }
}
