//! Error types for simulation setup and per-frame stepping.

use thiserror::Error;

/// Configuration rejected at setup time. These are always caught before
/// the first dispatch; nothing in the per-frame path reports them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("control points per strand must be in 2..={max}, got {got}")]
    ControlPointCount { got: u32, max: u32 },

    #[error("{name} must be positive and finite, got {got}")]
    NonPositiveScalar { name: &'static str, got: f32 },

    #[error("{name} must be finite")]
    NonFiniteParameter { name: &'static str },

    #[error("stiffness must be in 0..=1, got {got}")]
    StiffnessRange { got: f32 },

    #[error("curve samples must be >= 1")]
    CurveSamples,

    #[error("cross-section needs at least 3 points, got {got}")]
    CrossSectionPoints { got: u32 },

    #[error("curve points per strand {got} exceed the working limit {max}")]
    CurvePointsPerStrand { got: u32, max: u32 },

    #[error("geometry buffers would exceed the 32-bit index space")]
    BufferOverflow,

    #[error("skin data covers {got} vertices but the mesh has {expected}")]
    SkinLengthMismatch { got: usize, expected: usize },

    #[error("morph target {index} covers {got} vertices but the mesh has {expected}")]
    MorphLengthMismatch {
        index: usize,
        got: usize,
        expected: usize,
    },

    #[error("eight-influence skinning requires the extra index/weight pair")]
    MissingExtraInfluences,

    #[error("bone palette has {got} matrices but the skin references index {required}")]
    PaletteTooSmall { got: usize, required: usize },
}

/// A physics dispatch failed mid-frame. The host is expected to drop the
/// frame (skip geometry emission), never partially apply it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    #[error("strand {strand} produced a non-finite position")]
    NonFinite { strand: usize },
}
