//! Builder pattern for ControllerSession.

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::config::{HomingConfig, SystemConfig, WaitConfig};
use crate::driver::ChainDriver;
use crate::error::{ConfigError, Result};

use super::controller::ControllerSession;

/// Builder for opening a [`ControllerSession`].
pub struct ControllerSessionBuilder<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    driver: D,
    delay: DELAY,
    descriptor_filter: Option<String<32>>,
    rejected: Option<ConfigError>,
    wait: WaitConfig,
    homing: HomingConfig,
}

impl<D, DELAY> ControllerSessionBuilder<D, DELAY>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    /// Create a new builder with default polling settings.
    pub fn new(driver: D, delay: DELAY) -> Self {
        Self {
            driver,
            delay,
            descriptor_filter: None,
            rejected: None,
            wait: WaitConfig::default(),
            homing: HomingConfig::default(),
        }
    }

    /// Only consider controllers matching this enumeration mask.
    ///
    /// A mask longer than 32 bytes makes [`open`](Self::open) fail before
    /// any driver call.
    pub fn descriptor_filter(mut self, mask: &str) -> Self {
        match String::try_from(mask) {
            Ok(filter) => {
                self.descriptor_filter = Some(filter);
                self.rejected = None;
            }
            Err(_) => {
                self.descriptor_filter = None;
                self.rejected = Some(ConfigError::DescriptorFilterTooLong(mask.len()));
            }
        }
        self
    }

    /// Set the on-target polling for moves.
    pub fn wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Set the delay between on-target polls.
    pub fn poll_interval_ms(mut self, interval: u32) -> Self {
        self.wait.poll_interval_ms = interval;
        self
    }

    /// Set the motion timeout. `0` waits forever.
    pub fn motion_timeout_ms(mut self, timeout: u32) -> Self {
        self.wait.timeout_ms = timeout;
        self
    }

    /// Set the reference-move timeout. `0` waits forever.
    pub fn homing_timeout_ms(mut self, timeout: u32) -> Self {
        self.homing.timeout_ms = timeout;
        self
    }

    /// Configure from a SystemConfig.
    pub fn from_config(mut self, config: &SystemConfig) -> Self {
        self.descriptor_filter = config.chain.descriptor_filter.clone();
        self.rejected = None;
        self.wait = config.wait;
        self.homing = config.homing;
        self
    }

    /// Discover the chain, home every device and return the ready session.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the descriptor filter was rejected
    /// or the poll interval is zero, otherwise see [`ControllerSession::open`].
    pub fn open(self) -> Result<ControllerSession<D, DELAY>> {
        if let Some(e) = self.rejected {
            return Err(e.into());
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(0).into());
        }

        ControllerSession::open_with(
            self.driver,
            self.delay,
            self.descriptor_filter.as_deref(),
            self.wait,
            self.homing,
        )
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::driver::sim::{DriverCall, SimulatedChain};
    use crate::error::Error;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn test_overlong_filter_is_rejected() {
        let chain = SimulatedChain::with_linear_stages(1);
        let mask = "x".repeat(33);
        let result = ControllerSessionBuilder::new(chain.clone(), NoopDelay::new())
            .descriptor_filter(&mask)
            .open();

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::DescriptorFilterTooLong(33)))
        ));
        assert!(chain.calls().is_empty());
    }

    #[test]
    fn test_later_filter_replaces_rejected_one() {
        let chain = SimulatedChain::with_linear_stages(1);
        let session = ControllerSessionBuilder::new(chain.clone(), NoopDelay::new())
            .descriptor_filter(&"x".repeat(40))
            .descriptor_filter("C-863")
            .open()
            .unwrap();

        assert_eq!(session.len(), 1);
        assert_eq!(chain.calls()[0], DriverCall::Enumerate(Some("C-863".to_string())));
    }
}
