//! Procedural demo scene: a single-bone UV sphere the strands grow from.

use glam::{Mat4, Quat, Vec3};
use skinning::{SkinData, SourceMesh};

/// Generate a UV sphere with every vertex weighted fully to bone 0, so
/// spinning that one bone exercises the whole deform path.
pub fn demo_sphere(rings: u32, segments: u32, radius: f32) -> SourceMesh {
    let rings = rings.max(3);
    let segments = segments.max(3);
    let mut positions = Vec::new();
    let mut normals = Vec::new();

    for ring in 0..=rings {
        let phi = (ring as f32 / rings as f32) * std::f32::consts::PI;
        for seg in 0..segments {
            let theta = (seg as f32 / segments as f32) * std::f32::consts::TAU;
            let dir = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            positions.push(dir * radius);
            normals.push(dir);
        }
    }

    let count = positions.len();
    let mut mesh = SourceMesh::new(positions, normals);
    mesh.skin = Some(SkinData {
        indices: vec![[0, 0, 0, 0]; count],
        weights: vec![[1.0, 0.0, 0.0, 0.0]; count],
        ..Default::default()
    });
    mesh
}

/// World transform of the host for a given frame: a gentle bob and turn
/// so the delta-transform correction actually does something.
pub fn host_world(frame: u32) -> Mat4 {
    let t = frame as f32 * 0.02;
    Mat4::from_rotation_translation(
        Quat::from_rotation_y(t * 0.5),
        Vec3::new(t.sin() * 0.3, (t * 0.7).cos() * 0.1, 0.0),
    )
}

/// Single-bone palette spinning about Y.
pub fn bone_palette(frame: u32, spin: f32) -> [Mat4; 1] {
    [Mat4::from_rotation_y(frame as f32 * spin)]
}
