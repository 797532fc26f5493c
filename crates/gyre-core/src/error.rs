//! Error types for the Gyre simulation dashboard.
//!
//! Two families: [`ConfigError`] for anything rejected at construction
//! or start time, and [`StepError`] for failures while an engine
//! advances. Neither is retried automatically.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Configuration rejected at construction or start time.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Particle count is zero.
    InvalidParticleCount {
        /// The rejected count.
        value: usize,
    },
    /// Bounds half-width is NaN, infinite, zero, or negative.
    InvalidBounds {
        /// The rejected value.
        value: f64,
    },
    /// Time delta is NaN, infinite, zero, or negative.
    InvalidTimeDelta {
        /// The rejected value.
        value: f64,
    },
    /// A scheduler period of zero was requested.
    InvalidPeriod,
    /// tick_rate_hz is NaN, infinite, zero, or negative.
    InvalidTickRate {
        /// The rejected value.
        value: f64,
    },
    /// A control-surface setter received a value outside its range.
    OutOfRange {
        /// Name of the parameter.
        param: &'static str,
        /// The rejected value.
        value: f64,
        /// Inclusive lower limit.
        min: f64,
        /// Inclusive upper limit.
        max: f64,
    },
    /// A limit table has `min > max` or a non-finite endpoint.
    InvalidLimits {
        /// Name of the parameter whose range is malformed.
        param: &'static str,
    },
    /// A bounded queue was configured with zero capacity.
    QueueCapacityZero,
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParticleCount { value } => {
                write!(f, "particle_count must be at least 1, got {value}")
            }
            Self::InvalidBounds { value } => {
                write!(f, "bounds must be finite and positive, got {value}")
            }
            Self::InvalidTimeDelta { value } => {
                write!(f, "time_delta must be finite and positive, got {value}")
            }
            Self::InvalidPeriod => write!(f, "scheduler period must be positive"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::OutOfRange {
                param,
                value,
                min,
                max,
            } => write!(f, "{param} = {value} is outside [{min}, {max}]"),
            Self::InvalidLimits { param } => {
                write!(f, "limits for {param} are empty or non-finite")
            }
            Self::QueueCapacityZero => write!(f, "command queue capacity must be at least 1"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── StepError ──────────────────────────────────────────────────────

/// Failure while an engine advances by one time delta.
///
/// Returned unmodified from the tick that produced it; a scheduled task
/// stops ticking after the first one.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// An entity left the representable range (NaN or infinite position).
    NonFinite {
        /// Index of the first offending entity.
        entity: usize,
    },
    /// The time delta handed to `update` is not finite and positive.
    InvalidTimeDelta {
        /// The rejected value.
        value: f64,
    },
    /// Engine-specific failure.
    EngineFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { entity } => {
                write!(f, "entity {entity} has a non-finite position")
            }
            Self::InvalidTimeDelta { value } => {
                write!(f, "update called with invalid dt {value}")
            }
            Self::EngineFailed { reason } => write!(f, "engine failed: {reason}"),
        }
    }
}

impl Error for StepError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_the_parameter() {
        let e = ConfigError::OutOfRange {
            param: "bounds",
            value: 10.0,
            min: 25.0,
            max: 2500.0,
        };
        assert_eq!(e.to_string(), "bounds = 10 is outside [25, 2500]");
    }

    #[test]
    fn step_error_display() {
        let e = StepError::NonFinite { entity: 3 };
        assert_eq!(e.to_string(), "entity 3 has a non-finite position");
    }
}
