//! The simulation engine.
//!
//! [`Engine`] owns the particle field, the heavy particle set, the
//! configuration and the output buffer, and exposes the operations the
//! surrounding application calls between frames.
//!
//! # Example
//!
//! ```ignore
//! use dustfield::prelude::*;
//!
//! let mut engine = Engine::new(SimConfig::default(), Canvas::new(800.0, 600.0))?;
//! engine.resize(100_000)?;
//! engine.set_heavy_particles(4)?;
//!
//! loop {
//!     let frame = engine.step(time.delta());
//!     if frame.report.drawable() {
//!         renderer.upload(frame.output);
//!     }
//! }
//! ```

use glam::Vec2;

use crate::config::{Canvas, SettingChange, SimConfig};
use crate::error::EngineError;
use crate::field::{Particle, ParticleField};
use crate::heavy::HeavyParticleSet;
use crate::integrator::{FrameIntegrator, StepInputs, StepReport};
use crate::output::{ChannelLayout, OutputBuffer};
use crate::spawn::SpawnContext;

/// Result of [`Engine::step`]: the report plus the freshly written buffer.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub report: StepReport,
    pub output: &'a OutputBuffer,
}

/// Particle simulation state and its operation surface.
pub struct Engine {
    config: SimConfig,
    canvas: Canvas,
    field: ParticleField,
    heavy: HeavyParticleSet,
    output: OutputBuffer,
    integrator: FrameIntegrator,
    spawner: SpawnContext,
    drag_target: Option<Vec2>,
    pending: Vec<SettingChange>,
}

impl Engine {
    /// Create an engine with no particles. Call [`Engine::resize`] before
    /// the first step.
    pub fn new(config: SimConfig, canvas: Canvas) -> Result<Self, EngineError> {
        Self::with_spawner(config, canvas, ChannelLayout::default(), SpawnContext::new())
    }

    /// Create an engine with an explicit output layout and random source.
    ///
    /// `config` goes through [`SimConfig::validate`] first.
    pub fn with_spawner(
        mut config: SimConfig,
        canvas: Canvas,
        layout: ChannelLayout,
        spawner: SpawnContext,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            field: ParticleField::new(config.capacity),
            heavy: HeavyParticleSet::new(config.max_heavy),
            output: OutputBuffer::new(layout),
            integrator: FrameIntegrator::new(),
            spawner,
            drag_target: None,
            pending: Vec::new(),
            canvas,
            config,
        })
    }

    // ========== Queries ==========

    #[inline]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Current particle count.
    #[inline]
    pub fn len(&self) -> usize {
        self.field.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.field.is_empty()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        self.field.particles()
    }

    #[inline]
    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    #[inline]
    pub fn heavy_particles(&self) -> &HeavyParticleSet {
        &self.heavy
    }

    /// The buffer written by the last step.
    #[inline]
    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    #[inline]
    pub fn drag_target(&self) -> Option<Vec2> {
        self.drag_target
    }

    // ========== Particle count and placement ==========

    /// Replace every particle with `n` new ones in a filled disk around
    /// the canvas centre, and size the output buffer to match.
    pub fn resize(&mut self, n: usize) -> Result<(), EngineError> {
        if let Err(e) = self.field.validate_count(n) {
            log::warn!("resize rejected: {}", e);
            return Err(e);
        }
        self.field.create(
            n,
            self.canvas.center(),
            self.config.spawn_radius,
            self.config.fill_seed_speed,
            &mut self.spawner,
        )?;
        self.output.ensure_size(n);
        log::info!("spawned {} particles", n);
        Ok(())
    }

    /// Re-place every particle in a filled disk.
    pub fn respawn_filled(&mut self, center: Vec2, radius: f32) {
        self.field
            .respawn(center, radius, self.config.fill_seed_speed, &mut self.spawner);
        log::debug!("respawned filled disk r={} at {}", radius, center);
    }

    /// Re-place every particle in a hollow ring with outward seed speed.
    pub fn respawn_empty(&mut self, center: Vec2, radius: f32, ring_width: f32) {
        self.field.spawn_empty(
            center,
            radius,
            ring_width,
            self.config.ring_seed_speed,
            &mut self.spawner,
        );
        log::debug!("respawned ring r={} w={} at {}", radius, ring_width, center);
    }

    // ========== Impulses ==========

    /// Zero every velocity.
    pub fn stop(&mut self) {
        self.field.stop();
    }

    /// Push every particle away from `point`.
    pub fn explode(&mut self, point: Vec2, strength: f32) {
        self.field.explode(point, strength);
        log::debug!("explosion at {} strength {}", point, strength);
    }

    /// Drag every particle towards `target` on the following steps, or
    /// stop dragging with `None`.
    pub fn set_drag_target(&mut self, target: Option<Vec2>) {
        self.drag_target = target;
    }

    // ========== Heavy particles ==========

    /// Replace the heavy particles with a regular `k`-gon.
    pub fn set_heavy_particles(&mut self, k: usize) -> Result<(), EngineError> {
        self.heavy
            .create(k, self.canvas, self.config.heavy_radius_fraction)
            .inspect_err(|e| log::warn!("heavy particles rejected: {}", e))?;
        log::info!("placed {} heavy particles", k);
        Ok(())
    }

    pub fn clear_heavy_particles(&mut self) {
        self.heavy.clear();
        log::info!("cleared heavy particles");
    }

    // ========== Settings ==========

    pub fn set_bounce_x(&mut self, enabled: bool) {
        self.config.bounce_x = enabled;
    }

    pub fn set_bounce_y(&mut self, enabled: bool) {
        self.config.bounce_y = enabled;
    }

    pub fn set_squared_falloff(&mut self, enabled: bool) {
        self.config.squared_falloff = enabled;
    }

    pub fn set_spawn_radius(&mut self, radius: f32) {
        self.config.set_spawn_radius(radius);
    }

    /// Returns whether the coefficient was accepted (it must be `> 1`).
    pub fn set_friction(&mut self, friction: f32) -> bool {
        let accepted = self.config.set_friction(friction);
        if !accepted {
            log::warn!("friction {} rejected, keeping {}", friction, self.config.friction);
        }
        accepted
    }

    /// Update the canvas after a window resize. Particles keep their
    /// positions; heavy particles keep theirs until the next `set`.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// Switch the output layout; the buffer is resized on the next step.
    pub fn set_layout(&mut self, layout: ChannelLayout) {
        self.output.set_layout(layout);
    }

    /// Queue a change to be applied at the start of the next step.
    pub fn queue_change(&mut self, change: SettingChange) {
        self.pending.push(change);
    }

    /// Number of queued changes.
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }

    /// Apply every queued change in order.
    pub fn apply_pending(&mut self) {
        let mut pending = std::mem::take(&mut self.pending);
        for change in pending.drain(..) {
            self.apply_change(change);
        }
        // hand the allocation back for the next frame
        self.pending = pending;
    }

    /// Apply one change immediately. Rejected resizes are logged and
    /// leave the state untouched.
    pub fn apply_change(&mut self, change: SettingChange) {
        log::debug!("applying {:?}", change);
        match change {
            SettingChange::BounceX(v) => self.set_bounce_x(v),
            SettingChange::BounceY(v) => self.set_bounce_y(v),
            SettingChange::SquaredFalloff(v) => self.set_squared_falloff(v),
            SettingChange::SpawnRadius(r) => self.set_spawn_radius(r),
            SettingChange::Friction(f) => {
                self.set_friction(f);
            }
            SettingChange::ParticleCount(n) => {
                if let Err(e) = self.resize(n) {
                    log::debug!("queued resize to {} dropped: {}", n, e);
                }
            }
            SettingChange::Preset(preset) => {
                if let Err(e) = self.resize(preset.particle_count()) {
                    log::debug!("queued preset {:?} dropped: {}", preset, e);
                }
            }
        }
    }

    // ========== Stepping ==========

    /// Drain queued changes, then advance one frame.
    ///
    /// `dt` is clamped to `[min_dt, max_dt]` before use.
    pub fn step(&mut self, dt: f32) -> Frame<'_> {
        self.apply_pending();

        let inputs = StepInputs {
            config: &self.config,
            canvas: self.canvas,
            anchors: self.heavy.anchors(),
            drag_target: self.drag_target,
            dt,
        };
        let report = self.integrator.step(&inputs, &mut self.field, &mut self.output);
        Frame {
            report,
            output: &self.output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerformancePreset;

    fn engine() -> Engine {
        Engine::with_spawner(
            SimConfig::default(),
            Canvas::new(800.0, 600.0),
            ChannelLayout::PositionOpacity,
            SpawnContext::from_seed(17),
        )
        .unwrap()
    }

    #[test]
    fn test_resize_sizes_output() {
        let mut e = engine();
        e.resize(250).unwrap();
        assert_eq!(e.len(), 250);
        assert_eq!(e.output().len(), 750);
    }

    #[test]
    fn test_rejected_resize_keeps_state() {
        let mut e = engine();
        e.resize(20).unwrap();
        let before = e.particles().to_vec();
        assert!(e.resize(0).is_err());
        assert!(e.resize(6_000_000).is_err());
        assert_eq!(e.particles(), &before[..]);
        assert_eq!(e.output().len(), 60);
    }

    #[test]
    fn test_queued_changes_apply_at_step() {
        let mut e = engine();
        e.resize(10).unwrap();
        e.queue_change(SettingChange::BounceX(false));
        e.queue_change(SettingChange::Preset(PerformancePreset::UltraLow));
        assert!(e.config().bounce_x);
        assert_eq!(e.pending_changes(), 2);

        let frame = e.step(0.01);
        assert_eq!(frame.report.particles, 1000);
        assert_eq!(frame.output.len(), 3000);
        assert!(!e.config().bounce_x);
        assert_eq!(e.pending_changes(), 0);
    }

    #[test]
    fn test_rejected_queued_resize_keeps_state() {
        let mut e = engine();
        e.resize(30).unwrap();
        e.stop();
        let before = e.particles().to_vec();
        e.queue_change(SettingChange::ParticleCount(0));
        e.queue_change(SettingChange::ParticleCount(6_000_000));

        let frame = e.step(0.0);
        assert_eq!(frame.report.particles, 30);
        assert_eq!(frame.output.len(), 90);
        assert_eq!(e.particles(), &before[..]);
        assert_eq!(e.pending_changes(), 0);
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = SimConfig {
            friction: 0.5,
            ..SimConfig::default()
        };
        let err = Engine::new(config, Canvas::new(800.0, 600.0)).err();
        assert!(matches!(err, Some(EngineError::InvalidConfig { field: "friction", .. })));

        let config = SimConfig {
            min_dt: 0.05,
            ..SimConfig::default()
        };
        assert!(Engine::new(config, Canvas::new(800.0, 600.0)).is_err());
    }

    #[test]
    fn test_heavy_particles_replace() {
        let mut e = engine();
        e.set_heavy_particles(4).unwrap();
        e.set_heavy_particles(2).unwrap();
        assert_eq!(e.heavy_particles().len(), 2);
        assert!(e.set_heavy_particles(10).is_err());
        assert_eq!(e.heavy_particles().len(), 2);
        e.clear_heavy_particles();
        assert!(e.heavy_particles().is_empty());
    }

    #[test]
    fn test_friction_rejected() {
        let mut e = engine();
        assert!(!e.set_friction(0.9));
        assert_eq!(e.config().friction, SimConfig::default().friction);
    }

    #[test]
    fn test_layout_switch_resizes_on_step() {
        let mut e = engine();
        e.resize(8).unwrap();
        e.set_layout(ChannelLayout::Position);
        let frame = e.step(0.01);
        assert!(frame.report.reallocated);
        assert_eq!(frame.output.len(), 16);
    }
}
