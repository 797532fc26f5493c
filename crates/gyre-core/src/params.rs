//! Run-time parameters and the control-surface limits that bound them.
//!
//! [`RunParams`] is what a reset reads to build a fresh engine. Its
//! [`validate()`](RunParams::validate) only enforces what the engine
//! contract needs (a positive count, finite positive bounds and dt).
//! The narrower dashboard ranges live in [`ParamLimits`] and are
//! enforced by the control-surface setters.

use crate::error::ConfigError;

// ── RunParams ──────────────────────────────────────────────────────

/// Parameters read at reset time to construct and drive an engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunParams {
    /// Number of entities to construct. Default: 100.
    pub particle_count: usize,
    /// Half-width of the square `[-bounds, bounds]²` that initial
    /// positions are drawn from. Default: 100.
    pub bounds: f64,
    /// Time advanced by each tick. Default: 0.1.
    pub time_delta: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            particle_count: 100,
            bounds: 100.0,
            time_delta: 0.1,
        }
    }
}

impl RunParams {
    /// Check the invariants an engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::InvalidParticleCount {
                value: self.particle_count,
            });
        }
        if !self.bounds.is_finite() || self.bounds <= 0.0 {
            return Err(ConfigError::InvalidBounds { value: self.bounds });
        }
        if !self.time_delta.is_finite() || self.time_delta <= 0.0 {
            return Err(ConfigError::InvalidTimeDelta {
                value: self.time_delta,
            });
        }
        Ok(())
    }
}

// ── ParamRange ─────────────────────────────────────────────────────

/// Inclusive `[min, max]` range accepted by one setter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    /// Inclusive lower limit.
    pub min: f64,
    /// Inclusive upper limit.
    pub max: f64,
}

impl ParamRange {
    /// Create a range. Not validated until [`ParamLimits::validate`].
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range. NaN never does.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// `Ok(value)` if in range, otherwise [`ConfigError::OutOfRange`].
    pub fn check(&self, param: &'static str, value: f64) -> Result<f64, ConfigError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(ConfigError::OutOfRange {
                param,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }

    fn validate(&self, param: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidLimits { param });
        }
        Ok(())
    }
}

// ── ParamLimits ────────────────────────────────────────────────────

/// Ranges accepted by the dashboard's parameter setters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamLimits {
    /// Particle count range. Default: `[1, 1000]`.
    pub particle_count: ParamRange,
    /// Bounds range. Default: `[25, 2500]`.
    pub bounds: ParamRange,
    /// Time delta range. Default: `[0.1, 1.0]`.
    pub time_delta: ParamRange,
}

impl ParamLimits {
    /// The ranges exposed by the original dashboard sliders.
    pub const DASHBOARD: Self = Self {
        particle_count: ParamRange::new(1.0, 1000.0),
        bounds: ParamRange::new(25.0, 2500.0),
        time_delta: ParamRange::new(0.1, 1.0),
    };

    /// Check every range is finite and non-empty, and that the particle
    /// range cannot admit zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.particle_count.validate("particle_count")?;
        self.bounds.validate("bounds")?;
        self.time_delta.validate("time_delta")?;
        if self.particle_count.min < 1.0 {
            return Err(ConfigError::InvalidLimits {
                param: "particle_count",
            });
        }
        if self.bounds.min <= 0.0 {
            return Err(ConfigError::InvalidLimits { param: "bounds" });
        }
        if self.time_delta.min <= 0.0 {
            return Err(ConfigError::InvalidLimits {
                param: "time_delta",
            });
        }
        Ok(())
    }

    /// Check a particle count against its range.
    pub fn check_particle_count(&self, value: usize) -> Result<usize, ConfigError> {
        self.particle_count
            .check("particle_count", value as f64)
            .map(|_| value)
    }

    /// Check a bounds value against its range.
    pub fn check_bounds(&self, value: f64) -> Result<f64, ConfigError> {
        self.bounds.check("bounds", value)
    }

    /// Check a time delta against its range.
    pub fn check_time_delta(&self, value: f64) -> Result<f64, ConfigError> {
        self.time_delta.check("time_delta", value)
    }
}

impl Default for ParamLimits {
    fn default() -> Self {
        Self::DASHBOARD
    }
}
