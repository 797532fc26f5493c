//! Entity state exposed by a simulation engine.

/// A point in the simulation plane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance from the origin.
    pub fn radius(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Position and velocity of one simulated body.
///
/// Owned by the engine. The control loop only reads entities, except
/// while initializing velocities right after construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Entity {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Horizontal velocity.
    pub vx: f64,
    /// Vertical velocity.
    pub vy: f64,
}

impl Entity {
    /// An entity at rest at `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    /// The entity's position.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Magnitude of the velocity vector.
    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}
