//! Invisible gravity anchors.
//!
//! Heavy particles never move and are never drawn. The set is rebuilt as
//! a regular polygon around the canvas centre on every `create` call.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::config::Canvas;
use crate::error::EngineError;
use crate::spawn::polar;

/// A fixed attractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeavyParticle {
    pub position: Vec2,
}

/// Small set of attractors arranged as a regular k-gon.
#[derive(Debug, Clone, Default)]
pub struct HeavyParticleSet {
    anchors: Vec<HeavyParticle>,
    max: usize,
}

impl HeavyParticleSet {
    /// Create an empty set that accepts up to `max` anchors.
    pub fn new(max: usize) -> Self {
        Self {
            anchors: Vec::with_capacity(max),
            max,
        }
    }

    /// Replace the set with `k` anchors on a regular polygon.
    ///
    /// The polygon is centred on the canvas with circumradius
    /// `radius_fraction * min(width, height)`; its first vertex points
    /// straight up. `k = 1` puts a single anchor on the centre.
    pub fn create(&mut self, k: usize, canvas: Canvas, radius_fraction: f32) -> Result<(), EngineError> {
        if k == 0 || k > self.max {
            return Err(EngineError::InvalidHeavyCount {
                requested: k,
                max: self.max,
            });
        }

        let center = canvas.center();
        self.anchors.clear();
        if k == 1 {
            self.anchors.push(HeavyParticle { position: center });
            return Ok(());
        }

        let radius = radius_fraction * canvas.width.min(canvas.height);
        let step = TAU / k as f32;
        // polar() measures from +Y, so angle 0 is the top vertex
        self.anchors.extend((0..k).map(|i| HeavyParticle {
            position: center + polar(radius, i as f32 * step),
        }));
        Ok(())
    }

    /// Remove every anchor.
    pub fn clear(&mut self) {
        self.anchors.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn anchors(&self) -> &[HeavyParticle] {
        &self.anchors
    }

    /// Anchor positions, for the force model.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.anchors.iter().map(|h| h.position)
    }
}

/// Angle of `point` around `center`, measured counter-clockwise from +X.
pub fn angle_around(point: Vec2, center: Vec2) -> f32 {
    let d = point - center;
    d.y.atan2(d.x)
}

/// Angle of the first polygon vertex, measured counter-clockwise from +X.
pub const FIRST_VERTEX_ANGLE: f32 = FRAC_PI_2;
