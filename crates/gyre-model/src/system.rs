//! The particle system engine and its factory.

use gyre_core::{ConfigError, EngineFactory, Entity, SimulationEngine, StepError};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::particle::{Particle, CENTRAL_MASS, PARTICLE_MASS};

/// Seed used when none is given, so every reset reproduces the same cloud.
pub const DEFAULT_SEED: u64 = 1337;

// ── ParticleSystem ─────────────────────────────────────────────────

/// Direct-summation gravitational n-body system.
///
/// Construction places `count - 1` particles uniformly in
/// `[-bounds, bounds)²` and appends one heavy body at rest at the
/// origin, so the last entity always sits exactly at `(0, 0)`.
#[derive(Clone, Debug)]
pub struct ParticleSystem {
    entities: Vec<Entity>,
    particles: Vec<Particle>,
}

impl ParticleSystem {
    /// Build a system with the default seed.
    pub fn new(count: usize, bounds: f64) -> Result<Self, ConfigError> {
        Self::with_seed(count, bounds, DEFAULT_SEED)
    }

    /// Build a system whose placement is drawn from `seed`.
    pub fn with_seed(count: usize, bounds: f64, seed: u64) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidParticleCount { value: count });
        }
        if !bounds.is_finite() || bounds <= 0.0 {
            return Err(ConfigError::InvalidBounds { value: bounds });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut entities = Vec::with_capacity(count);
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count - 1 {
            let x = rng.gen_range(-bounds..bounds);
            let y = rng.gen_range(-bounds..bounds);
            entities.push(Entity::at(x, y));
            particles.push(Particle::with_mass(PARTICLE_MASS));
        }
        entities.push(Entity::at(0.0, 0.0));
        particles.push(Particle::with_mass(CENTRAL_MASS));

        Ok(Self {
            entities,
            particles,
        })
    }

    /// Number of particles, including the central body.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Always false: a system holds at least the central body.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Mass of each particle, in entity order.
    pub fn masses(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles.iter().map(|p| p.mass)
    }
}

impl SimulationEngine for ParticleSystem {
    fn update(&mut self, dt: f64) -> Result<(), StepError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(StepError::InvalidTimeDelta { value: dt });
        }

        // Forces are accumulated against the pre-step positions of every
        // body before any body moves.
        for i in 0..self.entities.len() {
            let at = self.entities[i];
            let mut accum = Particle::with_mass(self.particles[i].mass);
            for (j, other) in self.entities.iter().enumerate() {
                if i != j {
                    accum.add_force(&at, other, self.particles[j].mass);
                }
            }
            self.particles[i] = accum;
        }

        for (particle, state) in self.particles.iter_mut().zip(self.entities.iter_mut()) {
            particle.integrate(state, dt);
        }

        match self
            .entities
            .iter()
            .position(|e| !e.x.is_finite() || !e.y.is_finite())
        {
            Some(entity) => Err(StepError::NonFinite { entity }),
            None => Ok(()),
        }
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

// ── ParticleSystemFactory ──────────────────────────────────────────

/// Builds a [`ParticleSystem`] for every reset, always from the same seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParticleSystemFactory {
    /// Seed for initial placement.
    pub seed: u64,
}

impl ParticleSystemFactory {
    /// A factory drawing placements from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for ParticleSystemFactory {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl EngineFactory for ParticleSystemFactory {
    type Engine = ParticleSystem;

    fn construct(&self, particle_count: usize, bounds: f64) -> Result<ParticleSystem, ConfigError> {
        ParticleSystem::with_seed(particle_count, bounds, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_particles_is_a_config_error() {
        assert_eq!(
            ParticleSystem::new(0, 100.0).unwrap_err(),
            ConfigError::InvalidParticleCount { value: 0 }
        );
    }

    #[test]
    fn non_positive_bounds_rejected() {
        assert!(matches!(
            ParticleSystem::new(10, 0.0),
            Err(ConfigError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn last_entity_is_the_central_body_at_rest() {
        let sys = ParticleSystem::new(5, 50.0).unwrap();
        assert_eq!(sys.len(), 5);
        assert_eq!(sys.entities()[4], Entity::at(0.0, 0.0));
        assert_eq!(sys.masses().last(), Some(CENTRAL_MASS));
    }

    #[test]
    fn single_particle_is_only_the_central_body() {
        let sys = ParticleSystem::new(1, 25.0).unwrap();
        assert_eq!(sys.entities(), &[Entity::at(0.0, 0.0)]);
    }

    #[test]
    fn same_seed_same_placement() {
        let a = ParticleSystem::with_seed(50, 100.0, 7).unwrap();
        let b = ParticleSystem::with_seed(50, 100.0, 7).unwrap();
        let c = ParticleSystem::with_seed(50, 100.0, 8).unwrap();
        assert_eq!(a.entities(), b.entities());
        assert_ne!(a.entities(), c.entities());
    }

    #[test]
    fn update_pulls_particles_toward_the_center() {
        let mut sys = ParticleSystem::new(2, 100.0).unwrap();
        let before = sys.entities()[0].position().radius();
        for _ in 0..10 {
            sys.update(1.0).unwrap();
        }
        let after = sys.entities()[0].position().radius();
        assert!(after < before, "radius {before} -> {after}");
    }

    #[test]
    fn update_rejects_bad_dt() {
        let mut sys = ParticleSystem::new(3, 100.0).unwrap();
        assert_eq!(
            sys.update(0.0),
            Err(StepError::InvalidTimeDelta { value: 0.0 })
        );
    }

    #[test]
    fn non_finite_position_is_reported() {
        let mut sys = ParticleSystem::new(3, 100.0).unwrap();
        sys.entities_mut()[1].vx = f64::INFINITY;
        assert_eq!(sys.update(0.1), Err(StepError::NonFinite { entity: 1 }));
    }

    #[test]
    fn factory_uses_its_seed() {
        let factory = ParticleSystemFactory::with_seed(99);
        let built = factory.construct(20, 30.0).unwrap();
        let direct = ParticleSystem::with_seed(20, 30.0, 99).unwrap();
        assert_eq!(built.entities(), direct.entities());
    }

    proptest! {
        #[test]
        fn placement_stays_inside_bounds(count in 1usize..200, bounds in 0.5f64..5000.0, seed in any::<u64>()) {
            let sys = ParticleSystem::with_seed(count, bounds, seed).unwrap();
            prop_assert_eq!(sys.len(), count);
            for e in sys.entities() {
                prop_assert!(e.x >= -bounds && e.x <= bounds);
                prop_assert!(e.y >= -bounds && e.y <= bounds);
                prop_assert_eq!(e.speed(), 0.0);
            }
        }
    }
}
