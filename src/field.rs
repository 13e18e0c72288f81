//! The particle set.
//!
//! A [`ParticleField`] holds exactly `len()` particles between mutation
//! calls. Particles have no identity beyond their slot index, and a
//! resize or respawn replaces every slot.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rayon::prelude::*;

use crate::error::EngineError;
use crate::spawn::{radial_seed, SpawnContext};

/// Slots handed to one rayon task while spawning.
const SPAWN_CHUNK: usize = 16 * 1024;

/// A single point particle with implicit unit mass.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    pub fn at(position: Vec2) -> Self {
        Self::new(position, Vec2::ZERO)
    }
}

/// Radial distribution used when (re)spawning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnShape {
    /// Filled disk with the radius drawn uniformly in `[0, radius)`.
    Disk { radius: f32 },
    /// Hollow ring with the radius drawn in `[radius - width/2, radius + width/2)`.
    Ring { radius: f32, width: f32 },
}

impl SpawnShape {
    fn outer_radius(&self) -> f32 {
        match *self {
            SpawnShape::Disk { radius } => radius,
            SpawnShape::Ring { radius, .. } => radius,
        }
    }

    fn sample(&self, ctx: &mut SpawnContext) -> Vec2 {
        match *self {
            SpawnShape::Disk { radius } => ctx.linear_disk_offset(radius),
            SpawnShape::Ring { radius, width } => ctx.ring_offset(radius, width),
        }
    }
}

/// Ordered collection of particles with a hard capacity ceiling.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
    capacity: usize,
}

impl ParticleField {
    /// Create an empty field accepting at most `capacity` particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::new(),
            capacity,
        }
    }

    /// Create a field from explicit particles, ignoring the capacity check.
    pub fn from_particles(particles: Vec<Particle>, capacity: usize) -> Self {
        Self { particles, capacity }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Largest accepted particle count.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Check a requested count against the ceiling.
    pub fn validate_count(&self, n: usize) -> Result<(), EngineError> {
        if n == 0 {
            return Err(EngineError::InvalidParticleCount { requested: n });
        }
        if n > self.capacity {
            return Err(EngineError::CapacityExceeded {
                requested: n,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Discard every particle and spawn `n` new ones in a filled disk.
    ///
    /// Velocity points away from `center` and reaches `seed_speed` at the
    /// rim; pass `0.0` for particles at rest. On error nothing changes.
    pub fn create(
        &mut self,
        n: usize,
        center: Vec2,
        spawn_radius: f32,
        seed_speed: f32,
        ctx: &mut SpawnContext,
    ) -> Result<(), EngineError> {
        self.validate_count(n)?;
        self.particles.clear();
        self.particles.resize(n, Particle::default());
        self.fill(center, SpawnShape::Disk { radius: spawn_radius }, seed_speed, ctx);
        Ok(())
    }

    /// Re-place every particle in a filled disk, keeping the count.
    pub fn respawn(&mut self, center: Vec2, spawn_radius: f32, seed_speed: f32, ctx: &mut SpawnContext) {
        self.fill(center, SpawnShape::Disk { radius: spawn_radius }, seed_speed, ctx);
    }

    /// Re-place every particle in a hollow ring, keeping the count.
    pub fn spawn_empty(
        &mut self,
        center: Vec2,
        spawn_radius: f32,
        ring_width: f32,
        seed_speed: f32,
        ctx: &mut SpawnContext,
    ) {
        let shape = SpawnShape::Ring {
            radius: spawn_radius,
            width: ring_width.max(0.0),
        };
        self.fill(center, shape, seed_speed, ctx);
    }

    fn fill(&mut self, center: Vec2, shape: SpawnShape, seed_speed: f32, ctx: &mut SpawnContext) {
        let chunk_count = self.particles.len().div_ceil(SPAWN_CHUNK);
        let mut contexts: Vec<SpawnContext> = (0..chunk_count).map(|_| ctx.fork()).collect();
        let rim = shape.outer_radius();

        self.particles
            .par_chunks_mut(SPAWN_CHUNK)
            .zip(contexts.par_iter_mut())
            .for_each(|(chunk, local)| {
                for p in chunk {
                    let offset = shape.sample(local);
                    *p = Particle::new(center + offset, radial_seed(offset, rim, seed_speed));
                }
            });
    }

    /// Zero every velocity. Positions are untouched.
    pub fn stop(&mut self) {
        self.particles
            .par_iter_mut()
            .for_each(|p| p.velocity = Vec2::ZERO);
    }

    /// Push every particle away from `center` by `strength`.
    ///
    /// A particle sitting exactly on `center` is pushed along +X.
    pub fn explode(&mut self, center: Vec2, strength: f32) {
        self.particles.par_iter_mut().for_each(|p| {
            p.velocity += strength * explosion_direction(p.position, center);
        });
    }
}

/// Unit vector from `center` to `position`, or +X when they coincide.
#[inline]
pub fn explosion_direction(position: Vec2, center: Vec2) -> Vec2 {
    (position - center).try_normalize().unwrap_or(Vec2::X)
}
