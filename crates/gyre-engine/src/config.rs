//! Controller and dashboard configuration.
//!
//! [`ControllerConfig`] fixes the tick cadence and the setter limits for
//! a [`Controller`](crate::controller::Controller). [`DashboardConfig`]
//! adds the knobs of the threaded [`Dashboard`](crate::dashboard::Dashboard)
//! runtime. Both validate at construction; nothing is re-checked later.

use std::time::Duration;

use gyre_core::{ConfigError, ParamLimits};

// ── ControllerConfig ───────────────────────────────────────────────

/// Cadence and setter limits for a controller.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Tick rate while Running, in Hz. Default: 30.
    pub tick_rate_hz: f64,
    /// Ranges accepted by the parameter setters. Default: dashboard ranges.
    pub limits: ParamLimits,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30.0,
            limits: ParamLimits::DASHBOARD,
        }
    }
}

impl ControllerConfig {
    /// Check the tick rate and the limit table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.period()?;
        self.limits.validate()
    }

    /// The scheduler period implied by `tick_rate_hz`.
    ///
    /// Rejects rates that are not finite and positive, and rates so
    /// extreme that the period is zero or does not fit a `Duration`.
    pub fn period(&self) -> Result<Duration, ConfigError> {
        let hz = self.tick_rate_hz;
        let invalid = ConfigError::InvalidTickRate { value: hz };
        if !hz.is_finite() || hz <= 0.0 {
            return Err(invalid);
        }
        match Duration::try_from_secs_f64(1.0 / hz) {
            Ok(period) if !period.is_zero() => Ok(period),
            _ => Err(invalid),
        }
    }
}

// ── DashboardConfig ────────────────────────────────────────────────

/// Configuration for [`Dashboard`](crate::dashboard::Dashboard).
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Cadence and setter limits for the hosted controller.
    pub controller: ControllerConfig,
    /// Capacity of the bounded command channel. Default: 64.
    pub command_queue: usize,
    /// How often the control thread checks for a halted tick task while
    /// no command arrives, in milliseconds. Default: 50.
    pub fault_poll_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            command_queue: 64,
            fault_poll_ms: 50,
        }
    }
}

impl DashboardConfig {
    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controller.validate()?;
        if self.command_queue == 0 {
            return Err(ConfigError::QueueCapacityZero);
        }
        if self.fault_poll_ms == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        Ok(())
    }

    /// The control thread's idle poll interval.
    pub fn fault_poll(&self) -> Duration {
        Duration::from_millis(self.fault_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyre_core::ParamRange;

    #[test]
    fn default_period_is_thirty_hz() {
        let period = ControllerConfig::default().period().unwrap();
        assert_eq!(period.as_micros(), 33_333);
    }

    #[test]
    fn invalid_tick_rates_rejected() {
        for hz in [0.0, -30.0, f64::NAN, f64::INFINITY, 1e-300, 1e300] {
            let config = ControllerConfig {
                tick_rate_hz: hz,
                ..ControllerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidTickRate { .. })),
                "{hz} should be rejected"
            );
        }
    }

    #[test]
    fn bad_limits_surface_through_controller_config() {
        let config = ControllerConfig {
            limits: ParamLimits {
                time_delta: ParamRange::new(0.0, 1.0),
                ..ParamLimits::DASHBOARD
            },
            ..ControllerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLimits {
                param: "time_delta"
            })
        );
    }

    #[test]
    fn dashboard_config_checks_queue_and_poll() {
        DashboardConfig::default().validate().unwrap();
        let zero_queue = DashboardConfig {
            command_queue: 0,
            ..DashboardConfig::default()
        };
        assert_eq!(zero_queue.validate(), Err(ConfigError::QueueCapacityZero));
        let zero_poll = DashboardConfig {
            fault_poll_ms: 0,
            ..DashboardConfig::default()
        };
        assert_eq!(zero_poll.validate(), Err(ConfigError::InvalidPeriod));
    }
}
