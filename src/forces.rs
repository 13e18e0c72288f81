//! Per-particle force aggregation.
//!
//! Forces are applied as direct velocity deltas, in this order:
//! friction, drag towards a held target, then the pull of every heavy
//! particle. Nothing here touches positions.

use glam::Vec2;

use crate::config::SimConfig;

/// Distance law for the heavy particle pull.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Falloff {
    /// Pull magnitude does not depend on distance (`p = 1`).
    Linear,
    /// Pull magnitude falls off as `1/d` in falloff units (`p = 2`).
    #[default]
    Squared,
}

impl Falloff {
    pub fn from_squared(squared: bool) -> Self {
        if squared {
            Falloff::Squared
        } else {
            Falloff::Linear
        }
    }

    /// Exponent `p` in `delta / |delta|^p`.
    #[inline]
    pub fn exponent(self) -> i32 {
        match self {
            Falloff::Linear => 1,
            Falloff::Squared => 2,
        }
    }
}

/// Gains and clamps read from [`SimConfig`] once per step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceModel {
    /// Velocity is divided by this every step.
    pub friction: f32,
    pub drag_gain: f32,
    pub gravity_gain: f32,
    pub falloff: Falloff,
    pub falloff_distance: f32,
    /// Smallest distance used as a divisor.
    pub min_distance: f32,
}

impl ForceModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            friction: config.friction,
            drag_gain: config.drag_gain,
            gravity_gain: config.gravity_gain,
            falloff: Falloff::from_squared(config.squared_falloff),
            falloff_distance: config.falloff_distance.max(f32::EPSILON),
            min_distance: config.min_distance.max(f32::EPSILON),
        }
    }

    /// Per-frame multiplicative damping. Frame-rate dependent on purpose.
    #[inline]
    pub fn apply_friction(&self, velocity: Vec2) -> Vec2 {
        velocity / self.friction
    }

    /// Velocity delta pulling `position` towards `target`.
    ///
    /// Magnitude is `dt * drag_gain / |d|`, with `|d|` clamped to
    /// `min_distance`.
    #[inline]
    pub fn drag(&self, position: Vec2, target: Vec2, dt: f32) -> Vec2 {
        let d = target - position;
        let len = d.length();
        if len < self.min_distance {
            // inside the clamp radius the direction may be undefined
            let dir = d.try_normalize().unwrap_or(Vec2::ZERO);
            return dir * (dt * self.drag_gain / self.min_distance);
        }
        d * (dt * self.drag_gain / (len * len))
    }

    /// Velocity delta pulling `position` towards one anchor.
    ///
    /// Computes `dt * gravity_gain * u / |u|^p` where `u` is the offset
    /// measured in units of `falloff_distance`.
    #[inline]
    pub fn gravity(&self, position: Vec2, anchor: Vec2, dt: f32) -> Vec2 {
        let u = (anchor - position) / self.falloff_distance;
        let min_len = self.min_distance / self.falloff_distance;
        let len = u.length();
        if len < min_len {
            let dir = u.try_normalize().unwrap_or(Vec2::ZERO);
            return dir * (dt * self.gravity_gain * min_len.powi(1 - self.falloff.exponent()));
        }
        u * (dt * self.gravity_gain / len.powi(self.falloff.exponent()))
    }

    /// Apply friction, the optional drag and every anchor to one velocity.
    #[inline]
    pub fn accumulate<I>(&self, position: Vec2, velocity: Vec2, drag_target: Option<Vec2>, anchors: I, dt: f32) -> Vec2
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut v = self.apply_friction(velocity);
        if let Some(target) = drag_target {
            v += self.drag(position, target, dt);
        }
        for anchor in anchors {
            v += self.gravity(position, anchor, dt);
        }
        v
    }
}

impl Default for ForceModel {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(falloff: Falloff) -> ForceModel {
        ForceModel {
            falloff,
            ..ForceModel::default()
        }
    }

    #[test]
    fn test_friction_damps() {
        let m = ForceModel::default();
        let v = m.apply_friction(Vec2::new(10.0, -10.0));
        assert!(v.length() < Vec2::new(10.0, -10.0).length());
    }

    #[test]
    fn test_drag_direction_and_falloff() {
        let m = ForceModel::default();
        let near = m.drag(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.01);
        let far = m.drag(Vec2::ZERO, Vec2::new(100.0, 0.0), 0.01);
        assert!(near.x > 0.0 && near.y == 0.0);
        assert!((near.length() / far.length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_drag_on_target_is_finite() {
        let m = ForceModel::default();
        let dv = m.drag(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), 0.016);
        assert_eq!(dv, Vec2::ZERO);
        let dv = m.drag(Vec2::ZERO, Vec2::new(1e-4, 0.0), 0.016);
        assert!(dv.is_finite());
        assert!((dv.length() - 0.016 * m.drag_gain / m.min_distance).abs() < 1e-2);
    }

    #[test]
    fn test_gravity_points_at_anchor() {
        let m = ForceModel::default();
        let dv = m.gravity(Vec2::new(0.0, 0.0), Vec2::new(0.0, 50.0), 0.01);
        assert!(dv.y > 0.0);
        assert!(dv.x.abs() < 1e-6);
    }

    #[test]
    fn test_squared_crossover() {
        let linear = model(Falloff::Linear);
        let squared = model(Falloff::Squared);
        let dt = 1.0 / 60.0;

        let at = |m: &ForceModel, d: f32| m.gravity(Vec2::ZERO, Vec2::new(d, 0.0), dt).length();
        assert!(at(&squared, 10.0) > at(&linear, 10.0));
        assert!(at(&squared, 100.0) < at(&linear, 100.0));
    }

    #[test]
    fn test_linear_is_distance_independent() {
        let m = model(Falloff::Linear);
        let a = m.gravity(Vec2::ZERO, Vec2::new(10.0, 0.0), 0.01).length();
        let b = m.gravity(Vec2::ZERO, Vec2::new(0.0, 500.0), 0.01).length();
        assert!((a - b).abs() < 1e-5);
    }

    #[test]
    fn test_gravity_on_anchor_is_finite() {
        for falloff in [Falloff::Linear, Falloff::Squared] {
            let dv = model(falloff).gravity(Vec2::ONE, Vec2::ONE, 0.01);
            assert_eq!(dv, Vec2::ZERO);
        }
    }

    #[test]
    fn test_accumulate_sums_anchors() {
        let m = model(Falloff::Linear);
        let anchors = [Vec2::new(10.0, 0.0), Vec2::new(-10.0, 0.0)];
        let v = m.accumulate(Vec2::ZERO, Vec2::ZERO, None, anchors, 0.01);
        assert!(v.length() < 1e-6);
    }
}
