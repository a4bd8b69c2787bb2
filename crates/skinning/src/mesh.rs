//! Source mesh data: base geometry, skin weights, morph targets.

use glam::Vec3;
use sim_core::ConfigError;

/// Bone influence tier. The deform path is specialized for exactly
/// these two layouts; anything else is rejected at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfluenceTier {
    Four,
    Eight,
}

/// Per-vertex skinning data. `indices_extra`/`weights_extra` carry
/// influence slots 4..8 and must both be present for the Eight tier.
#[derive(Debug, Clone, Default)]
pub struct SkinData {
    pub indices: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices_extra: Vec<[u16; 4]>,
    pub weights_extra: Vec<[f32; 4]>,
}

impl SkinData {
    /// Influence tier implied by the data actually present.
    pub fn tier(&self) -> InfluenceTier {
        if self.indices_extra.is_empty() {
            InfluenceTier::Four
        } else {
            InfluenceTier::Eight
        }
    }

    /// Highest bone index referenced anywhere in the skin.
    pub fn max_bone_index(&self) -> usize {
        let base = self.indices.iter().flatten().copied().max().unwrap_or(0);
        let extra = self
            .indices_extra
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(0);
        base.max(extra) as usize
    }
}

/// One morph target: absolute target positions for every base vertex.
/// Displacement is `(target - base) * influence`, accumulated.
#[derive(Debug, Clone)]
pub struct MorphTarget {
    pub positions: Vec<Vec3>,
}

/// A deforming source mesh the simulation samples roots from.
///
/// `normals` may be empty; `normal(i)` then falls back to the direction
/// from the mesh-local origin to the vertex. That heuristic is only
/// accurate for star-convex meshes (known limitation, not validated).
#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub skin: Option<SkinData>,
    pub morphs: Vec<MorphTarget>,
}

impl SourceMesh {
    /// Create a rigid mesh with explicit normals.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals,
            skin: None,
            morphs: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Base normal for a vertex, with the centroid-direction fallback.
    pub fn normal(&self, index: usize) -> Vec3 {
        match self.normals.get(index) {
            Some(n) => *n,
            None => self.positions[index].normalize_or_zero(),
        }
    }

    /// Setup-time validation of skin and morph array shapes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let expected = self.vertex_count();
        if let Some(skin) = &self.skin {
            if skin.indices.len() != expected || skin.weights.len() != expected {
                return Err(ConfigError::SkinLengthMismatch {
                    got: skin.indices.len().min(skin.weights.len()),
                    expected,
                });
            }
            match (skin.indices_extra.is_empty(), skin.weights_extra.is_empty()) {
                (true, true) => {}
                (false, false) => {
                    if skin.indices_extra.len() != expected || skin.weights_extra.len() != expected
                    {
                        return Err(ConfigError::SkinLengthMismatch {
                            got: skin.indices_extra.len().min(skin.weights_extra.len()),
                            expected,
                        });
                    }
                }
                _ => return Err(ConfigError::MissingExtraInfluences),
            }
        }
        for (index, morph) in self.morphs.iter().enumerate() {
            if morph.positions.len() != expected {
                return Err(ConfigError::MorphLengthMismatch {
                    index,
                    got: morph.positions.len(),
                    expected,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
        ]
    }

    #[test]
    fn fallback_normal_points_away_from_origin() {
        let mesh = SourceMesh::new(quad(), Vec::new());
        assert!((mesh.normal(0) - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((mesh.normal(2) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn skin_length_mismatch_rejected() {
        let mut mesh = SourceMesh::new(quad(), Vec::new());
        mesh.skin = Some(SkinData {
            indices: vec![[0; 4]; 3],
            weights: vec![[0.0; 4]; 3],
            ..Default::default()
        });
        assert!(matches!(
            mesh.validate(),
            Err(ConfigError::SkinLengthMismatch { got: 3, expected: 4 })
        ));
    }

    #[test]
    fn lone_extra_pair_rejected() {
        let mut mesh = SourceMesh::new(quad(), Vec::new());
        mesh.skin = Some(SkinData {
            indices: vec![[0; 4]; 4],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 4],
            indices_extra: vec![[0; 4]; 4],
            weights_extra: Vec::new(),
        });
        assert!(matches!(
            mesh.validate(),
            Err(ConfigError::MissingExtraInfluences)
        ));
    }

    #[test]
    fn morph_length_mismatch_rejected() {
        let mut mesh = SourceMesh::new(quad(), Vec::new());
        mesh.morphs.push(MorphTarget {
            positions: vec![Vec3::ZERO; 2],
        });
        assert!(matches!(
            mesh.validate(),
            Err(ConfigError::MorphLengthMismatch { index: 0, .. })
        ));
    }
}
