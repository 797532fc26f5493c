//! Newtonian pairwise attraction and integration for one particle.
//!
//! Kinematic state lives in [`Entity`] so the system can hand out a
//! plain `&[Entity]` view; mass and the per-update acceleration live
//! alongside it in [`Particle`].

use gyre_core::Entity;

/// Newton's gravitational constant, in m³·kg⁻¹·s⁻².
pub const GRAVITY: f64 = 6.6743e-11;

/// Mass of an ordinary particle.
pub const PARTICLE_MASS: f64 = 5.0e6;

/// Mass of the body placed at the origin.
pub const CENTRAL_MASS: f64 = 1.0e12;

/// Mass and the acceleration accumulated during one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Horizontal acceleration accumulated since the last integration.
    pub ax: f64,
    /// Vertical acceleration accumulated since the last integration.
    pub ay: f64,
    /// Mass.
    pub mass: f64,
}

impl Particle {
    /// A particle of the given mass with no accumulated acceleration.
    pub fn with_mass(mass: f64) -> Self {
        Self {
            ax: 0.0,
            ay: 0.0,
            mass,
        }
    }

    /// Accumulate the acceleration a body of `other_mass` at `other`
    /// exerts on a particle at `at`.
    ///
    /// Coincident bodies exert no force on each other.
    pub fn add_force(&mut self, at: &Entity, other: &Entity, other_mass: f64) {
        let dx = other.x - at.x;
        let dy = other.y - at.y;
        let distance = dx.hypot(dy);
        if distance == 0.0 {
            return;
        }
        let accel = GRAVITY * other_mass / (distance * distance);
        self.ax += accel * dx / distance;
        self.ay += accel * dy / distance;
    }

    /// Semi-implicit Euler step of `state`, then clear the accumulator.
    pub fn integrate(&mut self, state: &mut Entity, dt: f64) {
        state.vx += self.ax * dt;
        state.vy += self.ay * dt;
        state.x += state.vx * dt;
        state.y += state.vy * dt;
        self.ax = 0.0;
        self.ay = 0.0;
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::with_mass(PARTICLE_MASS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attraction_points_toward_other() {
        let mut p = Particle::default();
        p.add_force(&Entity::at(10.0, 0.0), &Entity::at(0.0, 0.0), CENTRAL_MASS);
        assert!(p.ax < 0.0);
        assert_eq!(p.ay, 0.0);
        let expected = GRAVITY * CENTRAL_MASS / 100.0;
        assert!((p.ax + expected).abs() < 1e-12);
    }

    #[test]
    fn coincident_bodies_exert_no_force() {
        let mut p = Particle::default();
        let here = Entity::at(1.0, 1.0);
        p.add_force(&here, &here, PARTICLE_MASS);
        assert_eq!((p.ax, p.ay), (0.0, 0.0));
    }

    #[test]
    fn integrate_uses_updated_velocity_and_clears_acceleration() {
        let mut p = Particle {
            ax: 2.0,
            ..Particle::default()
        };
        let mut state = Entity {
            vx: 1.0,
            ..Entity::default()
        };
        p.integrate(&mut state, 0.5);
        // v = 1 + 2*0.5 = 2; x = 2*0.5 = 1
        assert_eq!(state.vx, 2.0);
        assert_eq!(state.x, 1.0);
        assert_eq!((p.ax, p.ay), (0.0, 0.0));
    }
}
