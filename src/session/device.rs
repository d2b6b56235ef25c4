//! Device handle for one controller on the chain.

use heapless::{String, Vec};

use crate::config::units::TravelRange;
use crate::driver::{AxisId, ChainAddress, MAX_AXES};
use crate::error::{AxisError, Result};

use super::state::DeviceState;

/// One controllable axis and its travel range.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisInfo {
    /// Controller-side axis identifier.
    pub id: AxisId,
    /// Travel range reported by the controller.
    pub range: TravelRange,
}

/// A connected device on the daisy chain.
///
/// Owned by the session; callers only ever see shared references.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    /// Position in the session's device list.
    index: usize,
    /// 1-based chain address.
    address: ChainAddress,
    /// Identification string reported by the chain.
    description: String<64>,
    /// Controllable axes, in controller order.
    axes: Vec<AxisInfo, MAX_AXES>,
    /// Lifecycle state.
    state: DeviceState,
}

impl DeviceHandle {
    pub(crate) fn new(index: usize, address: ChainAddress, description: String<64>) -> Self {
        Self {
            index,
            address,
            description,
            axes: Vec::new(),
            state: DeviceState::Uninitialized,
        }
    }

    /// Position in the session's device list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Chain address of the device.
    #[inline]
    pub fn address(&self) -> ChainAddress {
        self.address
    }

    /// Identification string reported by the chain.
    #[inline]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Controllable axes.
    #[inline]
    pub fn axes(&self) -> &[AxisInfo] {
        &self.axes
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// The axis used when none is given: the sole axis of a one-axis device.
    pub fn default_axis(&self) -> Option<&AxisId> {
        match self.axes.as_slice() {
            [only] => Some(&only.id),
            _ => None,
        }
    }

    /// Travel range of `axis`, or of the default axis when `None`.
    pub fn travel_range(&self, axis: Option<&str>) -> Result<TravelRange> {
        let id = self.resolve_axis(axis)?;
        Ok(self
            .axes
            .iter()
            .find(|a| &a.id == id)
            .map(|a| a.range)
            .unwrap_or_default())
    }

    /// Resolve an optional axis name to one of this device's axes.
    ///
    /// `None` yields the sole axis of a one-axis device and is
    /// [`AxisError::Ambiguous`] otherwise.
    pub fn resolve_axis(&self, axis: Option<&str>) -> Result<&AxisId> {
        match axis {
            None => self.default_axis().ok_or_else(|| {
                AxisError::Ambiguous {
                    index: self.index,
                    count: self.axes.len(),
                }
                .into()
            }),
            Some(name) => self
                .axes
                .iter()
                .map(|a| &a.id)
                .find(|id| **id == name)
                .ok_or_else(|| {
                    AxisError::Unknown {
                        index: self.index,
                        axis: crate::error::truncated(name),
                    }
                    .into()
                }),
        }
    }

    pub(crate) fn set_axes(&mut self, axes: Vec<AxisInfo, MAX_AXES>) {
        self.axes = axes;
    }

    pub(crate) fn set_state(&mut self, state: DeviceState) {
        self.state = state;
    }
}
