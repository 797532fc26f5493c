//! Reference gravitational particle system for the Gyre dashboard.
//!
//! [`ParticleSystem`] is a small direct-summation n-body model: a cloud
//! of light particles scattered uniformly over a square, orbiting one
//! heavy body pinned at the origin. It implements
//! [`SimulationEngine`](gyre_core::SimulationEngine) so the control loop
//! can drive it, and [`ParticleSystemFactory`] builds fresh instances on
//! reset.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod particle;
pub mod system;

pub use particle::{Particle, CENTRAL_MASS, GRAVITY, PARTICLE_MASS};
pub use system::{ParticleSystem, ParticleSystemFactory, DEFAULT_SEED};
