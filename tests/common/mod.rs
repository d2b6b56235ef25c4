//! Shared helpers for chain-stage integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use chain_stage::driver::sim::{DriverCall, SimulatedChain};
use chain_stage::{ChainAddress, ControllerSession, Millimeters, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal_mock::eh1::delay::NoopDelay;

/// Positioning tolerance used by the assertions.
pub const TOLERANCE: Millimeters = Millimeters(1e-9);

/// Session type used by most tests.
pub type SimSession = ControllerSession<SimulatedChain, NoopDelay>;

/// Open a session on a clone of `chain`; the original stays usable for inspection.
pub fn open(chain: &SimulatedChain) -> Result<SimSession> {
    ControllerSession::builder(chain.clone(), NoopDelay::new()).open()
}

/// Shorthand for a chain address.
pub fn addr(address: u8) -> ChainAddress {
    ChainAddress::new(address)
}

/// Delay provider that adds up the time it was asked to sleep.
#[derive(Debug, Clone, Default)]
pub struct CountingDelay {
    total_ns: Rc<Cell<u64>>,
}

impl CountingDelay {
    /// Total requested sleep in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

/// Indices in `calls` of every `MoveAbsolute`.
pub fn move_indices(calls: &[DriverCall]) -> Vec<usize> {
    calls
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, DriverCall::MoveAbsolute(..)))
        .map(|(i, _)| i)
        .collect()
}

/// Index in `calls` of the first `OnTarget`, if any.
pub fn first_on_target(calls: &[DriverCall]) -> Option<usize> {
    calls.iter().position(|c| matches!(c, DriverCall::OnTarget(..)))
}
