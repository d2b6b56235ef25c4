//! Per-device lifecycle state.
//!
//! `Uninitialized → Homing → Ready ⇄ Moving`, and any state `→ Closed`.

/// Lifecycle state of one chained device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Found on the chain, not yet connected or homed.
    #[default]
    Uninitialized,
    /// Reference move in progress.
    Homing,
    /// Referenced, servo on, not moving.
    Ready,
    /// A commanded move may still be in progress.
    Moving,
    /// The chain connection was released. Terminal.
    Closed,
}

impl DeviceState {
    /// State name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            DeviceState::Uninitialized => "Uninitialized",
            DeviceState::Homing => "Homing",
            DeviceState::Ready => "Ready",
            DeviceState::Moving => "Moving",
            DeviceState::Closed => "Closed",
        }
    }
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
