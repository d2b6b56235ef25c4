//! On-target polling.

use embedded_hal::delay::DelayNs;

use crate::config::max_polls;
use crate::driver::{ChainAddress, ChainDriver, DriverResult};

use super::device::AxisInfo;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    /// Every axis reported on-target after `polls` sleeps.
    OnTarget { polls: u32 },
    /// The timeout passed without all axes on target.
    TimedOut,
}

/// When a bounded wait gives up.
///
/// The sleep budget is `timeout / poll_interval` sleeps. With `std` the
/// wall clock is checked as well, so time spent inside driver calls counts
/// against the timeout. Whichever runs out first ends the wait.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    max_polls: Option<u32>,
    #[cfg(feature = "std")]
    expires: Option<std::time::Instant>,
}

impl Deadline {
    fn new(timeout_ms: Option<u32>, poll_interval_ms: u32) -> Self {
        Self {
            max_polls: max_polls(timeout_ms, poll_interval_ms),
            #[cfg(feature = "std")]
            expires: timeout_ms.and_then(|t| {
                std::time::Instant::now().checked_add(std::time::Duration::from_millis(u64::from(t)))
            }),
        }
    }

    fn passed(&self, polls: u32) -> bool {
        self.max_polls.is_some_and(|max| polls >= max) || self.clock_expired()
    }

    #[cfg(feature = "std")]
    fn clock_expired(&self) -> bool {
        self.expires.is_some_and(|at| std::time::Instant::now() >= at)
    }

    #[cfg(not(feature = "std"))]
    fn clock_expired(&self) -> bool {
        false
    }
}

/// Poll `on_target` for every axis until all report true.
///
/// The first poll happens immediately. Between polls the caller's thread
/// sleeps `poll_interval_ms` on `delay`. With `timeout_ms == None` this only
/// returns once the hardware reports on-target or a driver call fails.
pub(crate) fn poll_until_on_target<D, DELAY>(
    driver: &mut D,
    delay: &mut DELAY,
    address: ChainAddress,
    axes: &[AxisInfo],
    poll_interval_ms: u32,
    timeout_ms: Option<u32>,
) -> DriverResult<WaitOutcome>
where
    D: ChainDriver,
    DELAY: DelayNs,
{
    let deadline = Deadline::new(timeout_ms, poll_interval_ms);
    let mut polls = 0u32;
    loop {
        if all_on_target(driver, address, axes)? {
            return Ok(WaitOutcome::OnTarget { polls });
        }

        if deadline.passed(polls) {
            return Ok(WaitOutcome::TimedOut);
        }

        delay.delay_ms(poll_interval_ms);
        polls = polls.saturating_add(1);
    }
}

fn all_on_target<D: ChainDriver>(
    driver: &mut D,
    address: ChainAddress,
    axes: &[AxisInfo],
) -> DriverResult<bool> {
    for axis in axes {
        if !driver.on_target(address, &axis.id)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_deadline_never_passes() {
        let deadline = Deadline::new(None, 10);
        assert!(!deadline.passed(0));
        assert!(!deadline.passed(u32::MAX));
    }

    #[test]
    fn test_sleep_budget_ends_wait() {
        let deadline = Deadline::new(Some(60_000), 10);
        assert!(!deadline.passed(5_999));
        assert!(deadline.passed(6_000));
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_clock_ends_wait_before_budget() {
        let deadline = Deadline::new(Some(5), 1);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(deadline.passed(0));
    }
}
