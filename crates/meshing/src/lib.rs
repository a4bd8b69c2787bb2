//! Tube-mesh extrusion for strandsim.
//!
//! Turns each strand's relaxed control-point chain into tapered,
//! triangulated tube geometry: Hermite resampling along the chain,
//! parallel-transported cross-section frames, a per-vertex color
//! gradient, and a closed index topology. Output buffers are flat and
//! exactly sized at setup; a rendering sink consumes them directly.

pub mod hermite;
pub mod mesher;

pub use hermite::*;
pub use mesher::*;
