//! Simulation configuration.
//!
//! [`SimConfig`] is a plain struct of named values read fresh by every
//! step. It is changed either through the engine's setters or by pushing a
//! [`SettingChange`] that the engine drains at the next frame boundary.
//!
//! # Example
//!
//! ```ignore
//! use dustfield::config::{Settings, SettingChange};
//!
//! let settings = Settings::from_file("dustfield.json")?;
//! let mut engine = Engine::new(settings.sim.clone(), Canvas::new(1280.0, 720.0))?;
//! engine.queue_change(SettingChange::BounceX(false));
//! ```

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, EngineError};
use crate::output::ChannelLayout;
use crate::visuals::RenderConfig;

/// Size of the drawing surface in simulation units (pixels).
///
/// The origin is the bottom-left corner, Y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Canvas {
    /// Create a canvas. Non-positive dimensions are raised to one pixel.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Centre of the canvas.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Canvas dimensions as a vector.
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Values consumed by the force model, the boundary policy and the
/// respawn helpers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Reflect velocity when a particle leaves `[0, width]`.
    pub bounce_x: bool,
    /// Reflect velocity when a particle leaves `[0, height]`.
    pub bounce_y: bool,
    /// Inverse-square gravity instead of inverse-linear.
    pub squared_falloff: bool,
    /// Radius of the respawn disk (and of the hollow ring).
    pub spawn_radius: f32,
    /// Per-frame velocity divisor. Always `> 1`.
    pub friction: f32,
    /// Gain of the heavy particle pull.
    pub gravity_gain: f32,
    /// Gain of the drag-to-target pull.
    pub drag_gain: f32,
    /// Distance unit of the gravity law. Below it the squared law pulls
    /// harder than the linear one, above it weaker.
    pub falloff_distance: f32,
    /// Distances shorter than this are clamped before dividing.
    pub min_distance: f32,
    /// Velocities are expressed per `1 / time_scale` seconds.
    pub time_scale: f32,
    /// Upper clamp for `dt`.
    pub max_dt: f32,
    /// Lower clamp for `dt` (zero is let through unchanged).
    pub min_dt: f32,
    /// Largest accepted particle count.
    pub capacity: usize,
    /// Largest accepted heavy particle count.
    pub max_heavy: usize,
    /// Heavy polygon circumradius as a fraction of `min(width, height)`.
    pub heavy_radius_fraction: f32,
    /// Outward seed speed for filled respawns.
    pub fill_seed_speed: f32,
    /// Width of the hollow ring band.
    pub ring_width: f32,
    /// Outward seed speed for ring respawns.
    pub ring_seed_speed: f32,
    /// Impulse used by the explosion commands.
    pub explosion_strength: f32,
    /// Value written to the opacity channel of the three channel layout.
    pub trail_opacity: f32,
}

impl SimConfig {
    pub const SPAWN_RADIUS_RANGE: (f32, f32) = (20.0, 500.0);
    /// One hotkey per heavy particle count.
    pub const MAX_HEAVY: usize = 9;

    /// Set the respawn radius, clamped to [`Self::SPAWN_RADIUS_RANGE`].
    pub fn set_spawn_radius(&mut self, radius: f32) {
        let (lo, hi) = Self::SPAWN_RADIUS_RANGE;
        if radius.is_finite() {
            self.spawn_radius = radius.clamp(lo, hi);
        }
    }

    /// Set the friction coefficient.
    ///
    /// Values `<= 1` would amplify motion and are ignored. Returns whether
    /// the value was accepted.
    pub fn set_friction(&mut self, friction: f32) -> bool {
        if friction.is_finite() && friction > 1.0 {
            self.friction = friction;
            true
        } else {
            false
        }
    }

    /// Clamp a raw frame time into `[min_dt, max_dt]`.
    ///
    /// Zero passes through so a paused or frozen step moves nothing, which
    /// keeps `stop` followed by `step(0)` bit-identical even with heavy
    /// particles set. Negative and non-finite values are treated as zero.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        dt.max(self.min_dt).min(self.max_dt)
    }

    /// Check a configuration that did not come through the setters, e.g.
    /// one read from JSON.
    ///
    /// `spawn_radius` is clamped to [`Self::SPAWN_RADIUS_RANGE`] and
    /// `max_heavy` to `1..=`[`Self::MAX_HEAVY`]. Anything the step cannot
    /// run with is rejected and leaves `self` unchanged.
    pub fn validate(&mut self) -> Result<(), EngineError> {
        if !(self.friction.is_finite() && self.friction > 1.0) {
            return Err(invalid("friction", "must be finite and greater than 1"));
        }
        if !(self.min_dt.is_finite() && self.max_dt.is_finite() && self.min_dt > 0.0 && self.min_dt <= self.max_dt) {
            return Err(invalid("min_dt", "must satisfy 0 < min_dt <= max_dt"));
        }
        if !self.spawn_radius.is_finite() {
            return Err(invalid("spawn_radius", "must be finite"));
        }
        for (field, value) in [
            ("falloff_distance", self.falloff_distance),
            ("min_distance", self.min_distance),
            ("time_scale", self.time_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be finite and positive"));
            }
        }
        for (field, value) in [
            ("gravity_gain", self.gravity_gain),
            ("drag_gain", self.drag_gain),
            ("heavy_radius_fraction", self.heavy_radius_fraction),
            ("fill_seed_speed", self.fill_seed_speed),
            ("ring_width", self.ring_width),
            ("ring_seed_speed", self.ring_seed_speed),
            ("explosion_strength", self.explosion_strength),
            ("trail_opacity", self.trail_opacity),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be finite"));
            }
        }
        if self.capacity == 0 {
            return Err(invalid("capacity", "must be at least 1"));
        }

        let radius = self.spawn_radius;
        self.set_spawn_radius(radius);
        self.max_heavy = self.max_heavy.clamp(1, Self::MAX_HEAVY);
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> EngineError {
    EngineError::InvalidConfig { field, reason }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bounce_x: true,
            bounce_y: true,
            squared_falloff: true,
            spawn_radius: 200.0,
            friction: 1.001,
            gravity_gain: 30.0,
            drag_gain: 20_000.0,
            falloff_distance: 32.0,
            min_distance: 1.0,
            time_scale: 60.0,
            max_dt: 1.0 / 60.0,
            min_dt: 0.001,
            capacity: 5_000_000,
            max_heavy: Self::MAX_HEAVY,
            heavy_radius_fraction: 0.3,
            fill_seed_speed: 0.01,
            ring_width: 10.0,
            ring_seed_speed: 5.0,
            explosion_strength: 5.0,
            trail_opacity: 1.0,
        }
    }
}

/// Named particle counts offered by the performance selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum PerformancePreset {
    UltraLow,
    SuperLow,
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
    Ultra,
    Mega,
    Duper,
    Nightmare,
    UltraNightmare,
}

impl PerformancePreset {
    pub const ALL: [PerformancePreset; 12] = [
        PerformancePreset::UltraLow,
        PerformancePreset::SuperLow,
        PerformancePreset::VeryLow,
        PerformancePreset::Low,
        PerformancePreset::Medium,
        PerformancePreset::High,
        PerformancePreset::VeryHigh,
        PerformancePreset::Ultra,
        PerformancePreset::Mega,
        PerformancePreset::Duper,
        PerformancePreset::Nightmare,
        PerformancePreset::UltraNightmare,
    ];

    /// Particle count for this preset.
    pub fn particle_count(self) -> usize {
        match self {
            PerformancePreset::UltraLow => 1_000,
            PerformancePreset::SuperLow => 4_000,
            PerformancePreset::VeryLow => 7_000,
            PerformancePreset::Low => 10_000,
            PerformancePreset::Medium => 50_000,
            PerformancePreset::High => 100_000,
            PerformancePreset::VeryHigh => 500_000,
            PerformancePreset::Ultra => 1_000_000,
            PerformancePreset::Mega => 2_000_000,
            PerformancePreset::Duper => 3_000_000,
            PerformancePreset::Nightmare => 4_000_000,
            PerformancePreset::UltraNightmare => 5_000_000,
        }
    }
}

/// A parameter change waiting to be applied at the next frame boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    BounceX(bool),
    BounceY(bool),
    SquaredFalloff(bool),
    SpawnRadius(f32),
    Friction(f32),
    /// Resize to an explicit count.
    ParticleCount(usize),
    /// Resize to a preset count.
    Preset(PerformancePreset),
}

/// Everything needed to start a session, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub particles: usize,
    pub layout: ChannelLayout,
    pub sim: SimConfig,
    pub render: RenderConfig,
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Parse settings from a JSON string. The simulation values are
    /// validated and the render values clamped to their ranges.
    pub fn from_json(text: &str) -> Result<Self, AppError> {
        let mut settings: Self = serde_json::from_str(text)?;
        settings.sim.validate()?;
        settings.render.sanitize();
        Ok(settings)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: PerformancePreset::Ultra.particle_count(),
            layout: ChannelLayout::default(),
            sim: SimConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_friction_damps() {
        assert!(SimConfig::default().friction > 1.0);
    }

    #[test]
    fn test_friction_setter_rejects_amplification() {
        let mut config = SimConfig::default();
        assert!(!config.set_friction(1.0));
        assert!(!config.set_friction(0.5));
        assert!(!config.set_friction(f32::NAN));
        assert_eq!(config.friction, 1.001);

        assert!(config.set_friction(1.05));
        assert_eq!(config.friction, 1.05);
    }

    #[test]
    fn test_spawn_radius_clamped() {
        let mut config = SimConfig::default();
        config.set_spawn_radius(1000.0);
        assert_eq!(config.spawn_radius, 500.0);
        config.set_spawn_radius(1.0);
        assert_eq!(config.spawn_radius, 20.0);
    }

    #[test]
    fn test_clamp_dt() {
        let config = SimConfig::default();
        assert_eq!(config.clamp_dt(10.0), 1.0 / 60.0);
        assert_eq!(config.clamp_dt(0.0), 0.0);
        assert_eq!(config.clamp_dt(-1.0), 0.0);
        assert_eq!(config.clamp_dt(f32::INFINITY), 0.0);
        assert_eq!(config.clamp_dt(1e-6), 0.001);
        assert_eq!(config.clamp_dt(0.01), 0.01);
    }

    #[test]
    fn test_clamp_dt_never_panics_on_inverted_bounds() {
        let config = SimConfig {
            min_dt: 0.05,
            ..SimConfig::default()
        };
        assert_eq!(config.clamp_dt(0.01), config.max_dt);
    }

    #[test]
    fn test_validate_rejects_amplifying_friction() {
        for friction in [0.5, 1.0, f32::NAN] {
            let mut config = SimConfig {
                friction,
                ..SimConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig { field: "friction", .. }));
        }
    }

    #[test]
    fn test_validate_rejects_bad_dt_bounds() {
        for (min_dt, max_dt) in [(0.05, 1.0 / 60.0), (0.0, 0.01), (-0.001, 0.01), (f32::NAN, 0.01), (0.001, f32::INFINITY)] {
            let mut config = SimConfig {
                min_dt,
                max_dt,
                ..SimConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig { field: "min_dt", .. }));
        }
    }

    #[test]
    fn test_validate_clamps_radius_and_heavy() {
        let mut config = SimConfig {
            spawn_radius: 5000.0,
            max_heavy: 40,
            ..SimConfig::default()
        };
        config.validate().unwrap();
        assert_eq!(config.spawn_radius, 500.0);
        assert_eq!(config.max_heavy, 9);

        config.spawn_radius = 1.0;
        config.max_heavy = 0;
        config.validate().unwrap();
        assert_eq!(config.spawn_radius, 20.0);
        assert_eq!(config.max_heavy, 1);

        config.spawn_radius = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let mut config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_settings_json_is_validated() {
        let err = Settings::from_json(r#"{ "sim": { "friction": 0.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(EngineError::InvalidConfig { field: "friction", .. })
        ));

        let err = Settings::from_json(r#"{ "sim": { "min_dt": 0.05 } }"#).unwrap_err();
        assert!(matches!(
            err,
            AppError::Engine(EngineError::InvalidConfig { field: "min_dt", .. })
        ));

        let settings = Settings::from_json(r#"{ "sim": { "spawn_radius": 9000 }, "render": { "fade_alpha": 4.0 } }"#)
            .expect("clamped settings");
        assert_eq!(settings.sim.spawn_radius, 500.0);
        assert_eq!(settings.render.fade_alpha, 1.0);
    }

    #[test]
    fn test_presets_ascending() {
        let counts: Vec<usize> = PerformancePreset::ALL
            .iter()
            .map(|p| p.particle_count())
            .collect();
        assert!(counts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(counts[counts.len() - 1], SimConfig::default().capacity);
    }

    #[test]
    fn test_settings_partial_json() {
        let settings = Settings::from_json(r#"{ "particles": 1234, "sim": { "bounce_x": false } }"#)
            .expect("valid settings");
        assert_eq!(settings.particles, 1234);
        assert!(!settings.sim.bounce_x);
        assert!(settings.sim.bounce_y);
        assert_eq!(settings.sim.spawn_radius, 200.0);
    }

    #[test]
    fn test_canvas_center() {
        let canvas = Canvas::new(800.0, 600.0);
        assert_eq!(canvas.center(), Vec2::new(400.0, 300.0));
        assert_eq!(Canvas::new(0.0, -5.0).size(), Vec2::ONE);
    }
}
