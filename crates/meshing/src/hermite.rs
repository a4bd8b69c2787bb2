//! Cubic Hermite interpolation with a tunable tangent scale.

use glam::Vec3;

/// Interpolated position between `p0` and `p1` with endpoint tangents
/// `t0`/`t1` scaled by `tangent_scale` (a shape parameter, not a
/// physical unit).
#[inline]
pub fn hermite_point(p0: Vec3, p1: Vec3, t0: Vec3, t1: Vec3, t: f32, tangent_scale: f32) -> Vec3 {
    let scaled_t0 = t0 * tangent_scale;
    let scaled_t1 = t1 * tangent_scale;
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    p0 * h00 + scaled_t0 * h10 + p1 * h01 + scaled_t1 * h11
}

/// Derivative of [`hermite_point`] with respect to `t` (unnormalized).
#[inline]
pub fn hermite_tangent(p0: Vec3, p1: Vec3, t0: Vec3, t1: Vec3, t: f32, tangent_scale: f32) -> Vec3 {
    let t2 = t * t;
    let h00 = 6.0 * t2 - 6.0 * t;
    let h10 = 3.0 * t2 - 4.0 * t + 1.0;
    let h01 = -6.0 * t2 + 6.0 * t;
    let h11 = 3.0 * t2 - 2.0 * t;
    p0 * h00 + (t0 * tangent_scale) * h10 + p1 * h01 + (t1 * tangent_scale) * h11
}
