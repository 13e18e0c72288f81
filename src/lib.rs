//! # dustfield
//!
//! An interactive 2D particle toy: up to millions of massless particles
//! drift across a canvas, pulled by invisible heavy particles, dragged
//! towards the pointer and kicked by explosions.
//!
//! The simulation is plain CPU code in [`Engine`], split across the rayon
//! thread pool. Every step writes one packed record per particle into an
//! [`OutputBuffer`] of normalized device coordinates that the wgpu
//! renderer draws as instanced points.
//!
//! ## Quick Start
//!
//! ```ignore
//! use dustfield::prelude::*;
//!
//! let mut engine = Engine::new(SimConfig::default(), Canvas::new(1280.0, 720.0))?;
//! engine.resize(100_000)?;
//! engine.set_heavy_particles(3)?;
//!
//! let frame = engine.step(1.0 / 60.0);
//! assert_eq!(frame.output.len(), 3 * 100_000);
//! ```
//!
//! ## Core Concepts
//!
//! ### Particles
//!
//! A [`Particle`] is a position and a velocity on a canvas whose origin is
//! the bottom-left corner. Velocities are measured in pixels per 1/60 s
//! frame, so the motion looks the same at any refresh rate.
//!
//! ### Forces
//!
//! Each step applies, in order: friction, a drag towards the held target,
//! the pull of every heavy particle, integration, and wall reflection. See
//! [`ForceModel`] and [`BoundaryPolicy`].
//!
//! ### Heavy particles
//!
//! [`HeavyParticleSet`] places `k` attractors on the corners of a regular
//! polygon around the canvas centre. They never move and are never drawn.
//!
//! ### Settings
//!
//! [`SimConfig`] values can be changed directly through the engine setters
//! or queued as [`SettingChange`]s that apply at the next frame boundary.
//! A full [`Settings`] bundle can be loaded from JSON.

pub mod app;
pub mod boundary;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod forces;
mod gpu;
pub mod heavy;
pub mod input;
pub mod integrator;
pub mod output;
pub mod spawn;
pub mod textures;
pub mod time;
pub mod uniforms;
pub mod visuals;

pub use boundary::BoundaryPolicy;
pub use commands::{Command, Outcome};
pub use config::{Canvas, PerformancePreset, SettingChange, Settings, SimConfig};
pub use engine::{Engine, Frame};
pub use error::{AppError, EngineError, GpuError, TextureError};
pub use field::{Particle, ParticleField};
pub use forces::{Falloff, ForceModel};
pub use glam::Vec2;
pub use gpu::Renderer;
pub use heavy::{HeavyParticle, HeavyParticleSet};
pub use integrator::{FrameIntegrator, StepReport};
pub use output::{ChannelLayout, OutputBuffer};
pub use spawn::SpawnContext;
pub use textures::TextureConfig;
pub use time::Time;
pub use visuals::{BlendMode, Color, RenderConfig};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use dustfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::commands::{Command, Outcome};
    pub use crate::config::{Canvas, PerformancePreset, SettingChange, Settings, SimConfig};
    pub use crate::engine::{Engine, Frame};
    pub use crate::error::EngineError;
    pub use crate::field::Particle;
    pub use crate::output::{ChannelLayout, OutputBuffer};
    pub use crate::spawn::SpawnContext;
    pub use crate::visuals::RenderConfig;
    pub use crate::Vec2;
}
