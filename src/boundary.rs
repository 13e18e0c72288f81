//! Axis reflection at the canvas edges.

use glam::Vec2;

use crate::config::{Canvas, SimConfig};
use crate::field::Particle;

/// Which axes reflect particles that leave the canvas.
///
/// Only the velocity is flipped. The position is left outside the canvas
/// and the particle drifts back in over the following frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundaryPolicy {
    pub bounce_x: bool,
    pub bounce_y: bool,
}

impl BoundaryPolicy {
    pub fn new(bounce_x: bool, bounce_y: bool) -> Self {
        Self { bounce_x, bounce_y }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.bounce_x, config.bounce_y)
    }

    /// Flip velocity components for every enabled axis the particle is
    /// outside of.
    #[inline]
    pub fn apply(&self, particle: &mut Particle, canvas: Canvas) {
        let Vec2 { x, y } = particle.position;
        if self.bounce_x && !(0.0..=canvas.width).contains(&x) {
            particle.velocity.x = -particle.velocity.x;
        }
        if self.bounce_y && !(0.0..=canvas.height).contains(&y) {
            particle.velocity.y = -particle.velocity.y;
        }
    }
}
