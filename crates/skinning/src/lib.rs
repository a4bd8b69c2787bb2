//! Deformed-mesh vertex tracking for strandsim.
//!
//! Recomputes world-space positions and normals of a skinned/morphed
//! source mesh every frame, so strand roots can stay pinned to the
//! live surface. Knows nothing about strands; it is read by the
//! physics stepper through plain slices.

pub mod deform;
pub mod mesh;

pub use deform::*;
pub use mesh::*;
