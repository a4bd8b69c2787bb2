//! Strand simulation for strandsim: tendril pool, generation from a
//! source mesh, turbulence noise, and the per-frame verlet stepper.

pub mod generator;
pub mod noise;
pub mod pool;
pub mod stepper;

pub use generator::*;
pub use noise::*;
pub use pool::*;
pub use stepper::*;
