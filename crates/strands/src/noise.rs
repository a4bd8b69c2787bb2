//! Periodic, rotation-seeded gradient noise for the turbulence force.
//!
//! Simplex-type noise returning both the scalar value and its analytic
//! gradient (the turbulence force is the gradient, not the value).
//! Tiles with a configurable period and accepts a rotation angle that
//! spins every lattice gradient in the xy-plane, which is how the
//! simulation animates the field over time without scrolling it.
//!
//! Adapted from psrdnoise (Stefan Gustavson and Ian McEwan, MIT).

use glam::{Mat3, Vec3};

/// One noise evaluation: scalar value plus analytic gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSample {
    pub value: f32,
    pub gradient: Vec3,
}

/// Tileable gradient-noise field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicNoise {
    /// Tiling period per axis; a non-positive component disables
    /// wrapping on that axis.
    pub period: Vec3,
}

impl Default for PeriodicNoise {
    fn default() -> Self {
        Self {
            period: Vec3::splat(100.0),
        }
    }
}

fn mod289(x: f32) -> f32 {
    x - (x / 289.0).floor() * 289.0
}

fn permute289(v: [f32; 4]) -> [f32; 4] {
    v.map(|x| {
        let im = mod289(x);
        mod289((im * 34.0 + 10.0) * im)
    })
}

#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

/// Skew from world space to the simplex lattice.
const SKEW: Mat3 = Mat3::from_cols_array(&[0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0]);
/// Inverse skew.
const UNSKEW: Mat3 = Mat3::from_cols_array(&[-0.5, 0.5, 0.5, 0.5, -0.5, 0.5, 0.5, 0.5, -0.5]);

impl PeriodicNoise {
    pub fn new(period: Vec3) -> Self {
        Self { period }
    }

    /// Evaluate the field at `x` with the gradient set rotated by
    /// `rotation` radians in the xy-plane. Deterministic.
    pub fn sample(&self, x: Vec3, rotation: f32) -> NoiseSample {
        let uvw = SKEW * x;
        let i0 = uvw.floor();
        let f0 = uvw - i0;

        // Simplex corner selection from the fractional ordering.
        let gt_ = Vec3::new(step(f0.x, f0.y), step(f0.y, f0.z), step(f0.x, f0.z));
        let lt_ = Vec3::ONE - gt_;
        let gt = Vec3::new(lt_.z, gt_.x, gt_.y);
        let lt = Vec3::new(lt_.x, lt_.y, gt_.z);
        let o1 = gt.min(lt);
        let o2 = gt.max(lt);
        let mut i = [i0, i0 + o1, i0 + o2, i0 + Vec3::ONE];

        let v = [
            UNSKEW * i[0],
            UNSKEW * i[1],
            UNSKEW * i[2],
            UNSKEW * i[3],
        ];
        let xs = [x - v[0], x - v[1], x - v[2], x - v[3]];

        // Wrap the unskewed lattice points before hashing so the
        // gradient assignment tiles with the period.
        if self.period.cmpgt(Vec3::ZERO).any() {
            for lane in 0..4 {
                i[lane] = self.wrap(v[lane]);
            }
        }

        let hash = permute289(add4(
            permute289(add4(
                permute289([i[0].z, i[1].z, i[2].z, i[3].z]),
                [i[0].y, i[1].y, i[2].y, i[3].y],
            )),
            [i[0].x, i[1].x, i[2].x, i[3].x],
        ));

        let (sin_r, cos_r) = rotation.sin_cos();
        let mut g = [Vec3::ZERO; 4];
        for lane in 0..4 {
            let theta = hash[lane] * 3.883222077;
            let sz = hash[lane] * -0.006920415 + 0.996539792;
            let sz_prime = (1.0 - sz * sz).max(0.0).sqrt();
            let (st, ct) = theta.sin_cos();
            let gx = ct * sz_prime;
            let gy = st * sz_prime;
            g[lane] = Vec3::new(gx * cos_r - gy * sin_r, gx * sin_r + gy * cos_r, sz);
        }

        let mut value = 0.0;
        let mut gradient = Vec3::ZERO;
        for lane in 0..4 {
            let w = (0.5 - xs[lane].length_squared()).max(0.0);
            let w2 = w * w;
            let w3 = w2 * w;
            let gdotx = g[lane].dot(xs[lane]);
            value += w3 * gdotx;
            gradient += w3 * g[lane] - 6.0 * w2 * gdotx * xs[lane];
        }

        NoiseSample {
            value: 39.5 * value,
            gradient: 39.5 * gradient,
        }
    }

    /// Octave accumulation over the field, halving amplitude and
    /// doubling frequency per octave. `octaves` is clamped to >= 1.
    pub fn sample_octaves(&self, x: Vec3, rotation: f32, octaves: u32) -> NoiseSample {
        let mut value = 0.0;
        let mut gradient = Vec3::ZERO;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        for _ in 0..octaves.max(1) {
            let s = self.sample(x * frequency, rotation);
            value += amplitude * s.value;
            gradient += amplitude * frequency * s.gradient;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        NoiseSample { value, gradient }
    }

    fn wrap(&self, v: Vec3) -> Vec3 {
        let mut w = v;
        if self.period.x > 0.0 {
            w.x = v.x.rem_euclid(self.period.x);
        }
        if self.period.y > 0.0 {
            w.y = v.y.rem_euclid(self.period.y);
        }
        if self.period.z > 0.0 {
            w.z = v.z.rem_euclid(self.period.z);
        }
        (SKEW * w + Vec3::splat(0.5)).floor()
    }
}

fn add4(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
}
