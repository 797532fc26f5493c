//! Engine construction and velocity initialization for a reset.

use gyre_core::{ConfigError, EngineFactory, Entity, RunParams, SimulationEngine};

/// Entities closer to the origin than this keep their default velocity.
pub const ORIGIN_EPSILON: f64 = 1.0e-8;

/// Give every entity a unit velocity tangent to its circle about the
/// origin, counter-clockwise: `(vx, vy) = (-y/r, x/r)`.
///
/// Entities with `r <= ORIGIN_EPSILON` are left untouched. Returns how
/// many entities were skipped that way.
pub fn assign_orbital_velocities(entities: &mut [Entity]) -> usize {
    let mut at_origin = 0;
    for entity in entities.iter_mut() {
        let r = entity.x.hypot(entity.y);
        if r > ORIGIN_EPSILON {
            entity.vx = -entity.y / r;
            entity.vy = entity.x / r;
        } else {
            at_origin += 1;
        }
    }
    at_origin
}

/// Construct an engine from `params` and initialize its velocities.
pub fn build_engine<F: EngineFactory>(
    factory: &F,
    params: &RunParams,
) -> Result<F::Engine, ConfigError> {
    params.validate()?;
    let mut engine = factory.construct(params.particle_count, params.bounds)?;
    assign_orbital_velocities(engine.entities_mut());
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tangent_is_counter_clockwise_unit_vector() {
        let mut entities = [Entity::at(3.0, 4.0)];
        assign_orbital_velocities(&mut entities);
        let e = entities[0];
        assert!((e.vx - -0.8).abs() < 1e-12);
        assert!((e.vy - 0.6).abs() < 1e-12);
        assert!((e.speed() - 1.0).abs() < 1e-12);
        // Perpendicular to the radius.
        assert!((e.x * e.vx + e.y * e.vy).abs() < 1e-12);
    }

    #[test]
    fn origin_keeps_default_velocity() {
        let mut entities = [Entity::at(0.0, 0.0), Entity::at(1e-9, -1e-9)];
        let skipped = assign_orbital_velocities(&mut entities);
        assert_eq!(skipped, 2);
        for e in entities {
            assert_eq!((e.vx, e.vy), (0.0, 0.0));
        }
    }

    #[test]
    fn just_outside_epsilon_is_assigned() {
        let mut entities = [Entity::at(2e-8, 0.0)];
        assert_eq!(assign_orbital_velocities(&mut entities), 0);
        assert_eq!(entities[0].vx, 0.0);
        assert!((entities[0].vy - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn velocity_rule_holds_everywhere(x in -2500.0f64..2500.0, y in -2500.0f64..2500.0) {
            let mut entities = [Entity::at(x, y)];
            assign_orbital_velocities(&mut entities);
            let e = entities[0];
            let r = x.hypot(y);
            if r > ORIGIN_EPSILON {
                prop_assert!((e.vx - (-y / r)).abs() < 1e-12);
                prop_assert!((e.vy - (x / r)).abs() < 1e-12);
                prop_assert!((e.speed() - 1.0).abs() < 1e-9);
            } else {
                prop_assert_eq!((e.vx, e.vy), (0.0, 0.0));
            }
        }
    }
}
