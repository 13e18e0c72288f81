//! One simulation step.
//!
//! For every particle, in this order: friction, drag, heavy particle pull,
//! position integration, boundary reflection, output write. Particles do
//! not interact with each other, so the loop is split across the rayon
//! pool; the call returns only once every record is written.

use glam::Vec2;
use rayon::prelude::*;

use crate::boundary::BoundaryPolicy;
use crate::config::{Canvas, SimConfig};
use crate::field::{Particle, ParticleField};
use crate::forces::ForceModel;
use crate::heavy::HeavyParticle;
use crate::output::{OutputBuffer, OFFSCREEN};

/// Particles handed to one rayon task.
const STEP_CHUNK: usize = 8 * 1024;

/// Everything a step reads besides the particles themselves.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    pub config: &'a SimConfig,
    pub canvas: Canvas,
    pub anchors: &'a [HeavyParticle],
    /// Point the particles are dragged towards, while a drag is held.
    pub drag_target: Option<Vec2>,
    /// Raw frame time in seconds; clamped before use.
    pub dt: f32,
}

/// Outcome of a step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// The clamped time step actually integrated.
    pub dt: f32,
    pub particles: usize,
    /// Particles whose state went non-finite and were reset.
    pub non_finite: usize,
    /// Whether the output buffer had to be resized first.
    pub reallocated: bool,
}

impl StepReport {
    /// Whether the renderer should draw this frame.
    #[inline]
    pub fn drawable(&self) -> bool {
        self.non_finite == 0
    }
}

/// Applies the force model, integrates and fills the output buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameIntegrator;

impl FrameIntegrator {
    pub fn new() -> Self {
        Self
    }

    /// Advance `field` by one frame and write its NDC records to `out`.
    pub fn step(&self, inputs: &StepInputs<'_>, field: &mut ParticleField, out: &mut OutputBuffer) -> StepReport {
        let reallocated = out.ensure_size(field.len());

        let config = inputs.config;
        let dt = config.clamp_dt(inputs.dt);
        let advance = dt * config.time_scale;
        let forces = ForceModel::from_config(config);
        let boundary = BoundaryPolicy::from_config(config);
        let canvas = inputs.canvas;
        let anchors = inputs.anchors;
        let drag_target = inputs.drag_target;
        let channels = out.channels();
        let opacity = config.trail_opacity;

        let non_finite: usize = field
            .particles_mut()
            .par_chunks_mut(STEP_CHUNK)
            .zip(out.as_mut_slice().par_chunks_mut(STEP_CHUNK * channels))
            .map(|(particles, records)| {
                let mut bad = 0;
                for (p, record) in particles.iter_mut().zip(records.chunks_exact_mut(channels)) {
                    p.velocity = forces.accumulate(
                        p.position,
                        p.velocity,
                        drag_target,
                        anchors.iter().map(|h| h.position),
                        dt,
                    );
                    p.position += p.velocity * advance;
                    boundary.apply(p, canvas);

                    if p.position.is_finite() && p.velocity.is_finite() {
                        write_record(record, to_ndc(p.position, canvas), opacity);
                    } else {
                        *p = Particle::at(canvas.center());
                        write_record(record, Vec2::splat(OFFSCREEN), 0.0);
                        bad += 1;
                    }
                }
                bad
            })
            .sum();

        if non_finite > 0 {
            log::warn!(
                "{} particles went non-finite and were reset; skipping frame",
                non_finite
            );
        }

        StepReport {
            dt,
            particles: field.len(),
            non_finite,
            reallocated,
        }
    }
}

/// Map a canvas position to normalized device coordinates.
///
/// The canvas origin is bottom-left with Y up, the same orientation as
/// clip space, so no axis is flipped.
#[inline]
pub fn to_ndc(position: Vec2, canvas: Canvas) -> Vec2 {
    2.0 * position / canvas.size() - Vec2::ONE
}

#[inline]
fn write_record(record: &mut [f32], ndc: Vec2, opacity: f32) {
    record[0] = ndc.x;
    record[1] = ndc.y;
    if let Some(slot) = record.get_mut(2) {
        *slot = opacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ChannelLayout;

    const CANVAS: Canvas = Canvas {
        width: 800.0,
        height: 600.0,
    };

    fn inputs(config: &SimConfig, dt: f32) -> StepInputs<'_> {
        StepInputs {
            config,
            canvas: CANVAS,
            anchors: &[],
            drag_target: None,
            dt,
        }
    }

    #[test]
    fn test_to_ndc() {
        assert_eq!(to_ndc(Vec2::ZERO, CANVAS), Vec2::new(-1.0, -1.0));
        assert_eq!(to_ndc(CANVAS.center(), CANVAS), Vec2::ZERO);
        assert_eq!(to_ndc(CANVAS.size(), CANVAS), Vec2::ONE);
    }

    #[test]
    fn test_step_moves_and_writes() {
        let config = SimConfig::default();
        let mut field = ParticleField::from_particles(
            vec![Particle::new(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0))],
            10,
        );
        let mut out = OutputBuffer::new(ChannelLayout::PositionOpacity);
        let report = FrameIntegrator::new().step(&inputs(&config, 1.0 / 60.0), &mut field, &mut out);

        assert!(report.reallocated);
        assert!(report.drawable());
        let p = field.particles()[0];
        let expected_v = 1.0 / config.friction;
        assert!((p.velocity.x - expected_v).abs() < 1e-6);
        assert!((p.position.x - (400.0 + expected_v)).abs() < 1e-4);

        let rec = out.as_slice();
        assert_eq!(rec.len(), 3);
        assert!((rec[0] - to_ndc(p.position, CANVAS).x).abs() < 1e-6);
        assert_eq!(rec[2], config.trail_opacity);
    }

    #[test]
    fn test_bounce_on_crossing_step() {
        let config = SimConfig::default();
        let mut field = ParticleField::from_particles(
            vec![Particle::new(Vec2::new(799.5, 300.0), Vec2::new(2.0, 0.0))],
            10,
        );
        let mut out = OutputBuffer::new(ChannelLayout::Position);
        FrameIntegrator::new().step(&inputs(&config, 1.0 / 60.0), &mut field, &mut out);
        let p = field.particles()[0];
        assert!(p.position.x > 800.0);
        assert!(p.velocity.x < 0.0);
    }

    #[test]
    fn test_non_finite_particle_is_reset() {
        let config = SimConfig::default();
        let mut field = ParticleField::from_particles(
            vec![
                Particle::new(Vec2::new(f32::NAN, 1.0), Vec2::ZERO),
                Particle::at(Vec2::new(10.0, 10.0)),
            ],
            10,
        );
        let mut out = OutputBuffer::new(ChannelLayout::PositionOpacity);
        let report = FrameIntegrator::new().step(&inputs(&config, 0.01), &mut field, &mut out);

        assert_eq!(report.non_finite, 1);
        assert!(!report.drawable());
        assert!(out.all_finite());
        assert_eq!(&out.as_slice()[..3], &[OFFSCREEN, OFFSCREEN, 0.0]);
        assert_eq!(field.particles()[0], Particle::at(CANVAS.center()));

        let report = FrameIntegrator::new().step(&inputs(&config, 0.01), &mut field, &mut out);
        assert!(report.drawable());
    }

    #[test]
    fn test_drag_pulls_towards_target() {
        let config = SimConfig::default();
        let mut field = ParticleField::from_particles(vec![Particle::at(Vec2::new(100.0, 100.0))], 10);
        let mut out = OutputBuffer::new(ChannelLayout::Position);
        let step = StepInputs {
            drag_target: Some(Vec2::new(200.0, 100.0)),
            ..inputs(&config, 1.0 / 60.0)
        };
        FrameIntegrator::new().step(&step, &mut field, &mut out);
        assert!(field.particles()[0].velocity.x > 0.0);
        assert_eq!(field.particles()[0].velocity.y, 0.0);
    }

    #[test]
    fn test_heavy_particles_pull() {
        let config = SimConfig::default();
        let anchors = [HeavyParticle {
            position: Vec2::new(100.0, 200.0),
        }];
        let mut field = ParticleField::from_particles(vec![Particle::at(Vec2::new(100.0, 100.0))], 10);
        let mut out = OutputBuffer::new(ChannelLayout::Position);
        let step = StepInputs {
            anchors: &anchors,
            ..inputs(&config, 1.0 / 60.0)
        };
        FrameIntegrator::new().step(&step, &mut field, &mut out);
        assert!(field.particles()[0].velocity.y > 0.0);
    }
}
