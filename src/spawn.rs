//! Spawn context for particle placement.
//!
//! Provides the sampling laws used by the respawn operations. The RNG is
//! seeded from the wall clock by default so every respawn looks different,
//! or from an explicit seed for reproducible runs and tests.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Random source and helpers for placing particles in the plane.
///
/// ```ignore
/// let mut ctx = SpawnContext::from_seed(7);
/// let p = center + ctx.linear_disk_offset(200.0);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a context seeded from the current time.
    pub fn new() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::from_seed(seed)
    }

    /// Create a context with a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Derive an independent context, e.g. one per worker chunk.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.rng.gen())
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random angle in `[0, 2π)`.
    #[inline]
    pub fn random_angle(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }

    // ========== Position helpers ==========

    /// Offset inside a disk with the radius drawn uniformly.
    ///
    /// This is not area-uniform: particles bunch up towards the centre,
    /// which gives the bright core of a fresh respawn.
    pub fn linear_disk_offset(&mut self, radius: f32) -> Vec2 {
        let r = self.random_range(0.0, radius);
        polar(r, self.random_angle())
    }

    /// Offset inside the band `[radius - width/2, radius + width/2)`.
    pub fn ring_offset(&mut self, radius: f32, width: f32) -> Vec2 {
        let half = width * 0.5;
        let r = self.random_range(radius - half, radius + half);
        polar(r, self.random_angle())
    }
}

impl Default for SpawnContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Point at radius `r` and angle `theta`.
///
/// Uses `(r·sinθ, r·cosθ)` so that θ = 0 points along +Y.
#[inline]
pub fn polar(r: f32, theta: f32) -> Vec2 {
    let (sin, cos) = theta.sin_cos();
    Vec2::new(r * sin, r * cos)
}

/// Velocity pointing away from `center`, growing linearly with distance
/// and reaching `speed` at `radius`.
#[inline]
pub fn radial_seed(offset: Vec2, radius: f32, speed: f32) -> Vec2 {
    if speed == 0.0 {
        return Vec2::ZERO;
    }
    offset * (speed / radius.max(f32::EPSILON))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_disk_bounds() {
        let mut ctx = SpawnContext::from_seed(1);
        for _ in 0..1000 {
            assert!(ctx.linear_disk_offset(50.0).length() <= 50.0 + 0.001);
        }
    }

    #[test]
    fn test_linear_disk_is_center_heavy() {
        // Half of the samples land within half the radius, against a quarter
        // for an area-uniform disk.
        let mut ctx = SpawnContext::from_seed(2);
        let n = 10_000;
        let inner = (0..n)
            .filter(|_| ctx.linear_disk_offset(100.0).length() < 50.0)
            .count();
        let fraction = inner as f32 / n as f32;
        assert!((fraction - 0.5).abs() < 0.03, "fraction = {fraction}");
    }

    #[test]
    fn test_ring_band() {
        let mut ctx = SpawnContext::from_seed(3);
        for _ in 0..1000 {
            let r = ctx.ring_offset(200.0, 10.0).length();
            assert!((195.0 - 0.001..=205.0 + 0.001).contains(&r), "r = {r}");
        }
    }

    #[test]
    fn test_seeded_contexts_repeat() {
        let mut a = SpawnContext::from_seed(99);
        let mut b = SpawnContext::from_seed(99);
        assert_eq!(a.linear_disk_offset(10.0), b.linear_disk_offset(10.0));
    }

    #[test]
    fn test_polar_axes() {
        let up = polar(2.0, 0.0);
        assert!((up - Vec2::new(0.0, 2.0)).length() < 1e-6);
        let right = polar(2.0, std::f32::consts::FRAC_PI_2);
        assert!((right - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_radial_seed() {
        assert_eq!(radial_seed(Vec2::new(3.0, 4.0), 5.0, 0.0), Vec2::ZERO);
        let v = radial_seed(Vec2::new(3.0, 4.0), 5.0, 10.0);
        assert!((v.length() - 10.0).abs() < 1e-5);
        assert!(radial_seed(Vec2::ONE, 0.0, 1.0).is_finite());
    }

    #[test]
    fn test_empty_range() {
        let mut ctx = SpawnContext::from_seed(0);
        assert_eq!(ctx.random_range(3.0, 3.0), 3.0);
    }
}
