//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::SystemConfig;

/// Validate a system configuration.
///
/// Checks:
/// - Poll interval is non-zero
/// - Bounded timeouts are at least one poll interval long
/// - Stage axes are bound to distinct devices
///
/// Whether the bound devices exist is only known after the chain is opened,
/// so that check happens when the stage is built.
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    let poll = config.wait.poll_interval_ms;
    if poll == 0 {
        return Err(ConfigError::InvalidPollInterval(poll).into());
    }

    for timeout in [config.wait.timeout(), config.homing.timeout()].into_iter().flatten() {
        if timeout < poll {
            return Err(ConfigError::TimeoutShorterThanPoll {
                timeout_ms: timeout,
                poll_interval_ms: poll,
            }
            .into());
        }
    }

    if let Some(index) = config.stage.axes.duplicate() {
        return Err(ConfigError::DuplicateAxisBinding(index).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisBindings;
    use crate::error::Error;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SystemConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_poll_interval() {
        let mut config = SystemConfig::default();
        config.wait.poll_interval_ms = 0;

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidPollInterval(0)))
        ));
    }

    #[test]
    fn test_homing_timeout_shorter_than_poll() {
        let mut config = SystemConfig::default();
        config.wait.poll_interval_ms = 100;
        config.homing.timeout_ms = 50;

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::TimeoutShorterThanPoll {
                timeout_ms: 50,
                poll_interval_ms: 100
            }))
        ));
    }

    #[test]
    fn test_unbounded_timeout_is_valid() {
        let mut config = SystemConfig::default();
        config.wait.timeout_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_axis_binding() {
        let mut config = SystemConfig::default();
        config.stage.axes = AxisBindings { x: 0, y: 0, z: 1 };

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicateAxisBinding(0)))
        ));
    }
}
