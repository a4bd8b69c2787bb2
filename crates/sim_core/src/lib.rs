//! Core types and utilities for strandsim.
//!
//! This crate provides the foundational types used across all simulation
//! systems:
//! - Simulation and meshing parameter structs with fail-fast validation
//! - Output buffer sizing (single source of truth)
//! - Cross-frame motion tracking for the host mesh
//! - Time management and easing helpers

pub mod config;
pub mod easing;
pub mod error;
pub mod motion;
pub mod time;

pub use config::*;
pub use easing::*;
pub use error::*;
pub use motion::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
