//! Driver capability interface.
//!
//! [`ChainDriver`] is the only boundary to the vendor SDK. Everything the
//! session does to hardware goes through it. Implementations keep all
//! vendor-specific typing and string commands behind this trait.

#[cfg(feature = "std")]
pub mod sim;

use core::fmt;

use heapless::{String, Vec};
use thiserror::Error;

use crate::config::units::{Millimeters, TravelRange};

/// Maximum number of locally attached controllers reported by enumeration.
pub const MAX_CONTROLLERS: usize = 8;

/// Maximum number of positions on one daisy chain.
pub const MAX_CHAIN_DEVICES: usize = 16;

/// Maximum number of controllable axes per device.
pub const MAX_AXES: usize = 4;

/// Descriptor of a locally attached controller, as reported by enumeration.
pub type Descriptor = String<64>;

/// 1-based position of a device on the daisy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChainAddress(u8);

impl ChainAddress {
    /// Create a chain address. Addresses start at 1.
    #[inline]
    pub const fn new(address: u8) -> Self {
        Self(address)
    }

    /// Address of the chain slot at 0-based `position`.
    #[inline]
    pub const fn from_slot(position: u8) -> Self {
        Self(position + 1)
    }

    /// Get the raw address.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Controller-side axis identifier (for example `"1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AxisId(String<8>);

impl AxisId {
    /// Create an axis identifier.
    ///
    /// Returns `None` if the name does not fit.
    pub fn new(name: &str) -> Option<Self> {
        String::try_from(name).ok().map(Self)
    }

    /// Get the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq<&str> for AxisId {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == *other
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// State of one position on the daisy chain after the master is opened.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainSlot {
    /// A device answers at this position; carries its identification string.
    Connected(String<64>),
    /// Nothing answers at this position.
    NotConnected,
}

impl ChainSlot {
    /// Check whether a device answers at this position.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, ChainSlot::Connected(_))
    }
}

/// Error reported by a driver call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("driver error {code}: {message}")]
pub struct DriverError {
    /// Vendor error code.
    pub code: i32,
    /// Vendor error text.
    pub message: String<64>,
}

impl DriverError {
    /// Create a driver error, truncating the message if needed.
    pub fn new(code: i32, message: &str) -> Self {
        Self {
            code,
            message: crate::error::truncated(message),
        }
    }
}

/// Names of the driver operations, carried by communication errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverOp {
    /// [`ChainDriver::enumerate`]
    Enumerate,
    /// [`ChainDriver::open_chain`]
    OpenChain,
    /// [`ChainDriver::connect`]
    Connect,
    /// [`ChainDriver::close_chain`]
    CloseChain,
    /// [`ChainDriver::axes`]
    Axes,
    /// [`ChainDriver::travel_range`]
    TravelRange,
    /// [`ChainDriver::enable_servo`]
    EnableServo,
    /// [`ChainDriver::home`]
    Home,
    /// [`ChainDriver::is_referenced`]
    IsReferenced,
    /// [`ChainDriver::move_absolute`]
    MoveAbsolute,
    /// [`ChainDriver::position`]
    Position,
    /// [`ChainDriver::on_target`]
    OnTarget,
}

impl DriverOp {
    /// Operation name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            DriverOp::Enumerate => "enumerate",
            DriverOp::OpenChain => "open_chain",
            DriverOp::Connect => "connect",
            DriverOp::CloseChain => "close_chain",
            DriverOp::Axes => "axes",
            DriverOp::TravelRange => "travel_range",
            DriverOp::EnableServo => "enable_servo",
            DriverOp::Home => "home",
            DriverOp::IsReferenced => "is_referenced",
            DriverOp::MoveAbsolute => "move_absolute",
            DriverOp::Position => "position",
            DriverOp::OnTarget => "on_target",
        }
    }
}

impl fmt::Display for DriverOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type for driver calls.
pub type DriverResult<T> = core::result::Result<T, DriverError>;

/// Capabilities the session needs from a daisy-chain motion controller SDK.
///
/// All methods take `&mut self`: the chain protocol does not pipeline requests
/// across devices, so one command is in flight at a time.
///
/// Blocking wait-for-target is not part of the trait. The session builds it
/// from [`on_target`](ChainDriver::on_target) so it can enforce timeouts.
pub trait ChainDriver {
    /// List locally attached controllers, optionally filtered by a vendor mask.
    fn enumerate(&mut self, mask: Option<&str>) -> DriverResult<Vec<Descriptor, MAX_CONTROLLERS>>;

    /// Open `descriptor` as daisy-chain master and report every chain position.
    ///
    /// Slot `i` of the result is chain address `i + 1`.
    fn open_chain(&mut self, descriptor: &str) -> DriverResult<Vec<ChainSlot, MAX_CHAIN_DEVICES>>;

    /// Establish the sub-connection to the device at `address`.
    fn connect(&mut self, address: ChainAddress) -> DriverResult<()>;

    /// Release the daisy-chain connection and all sub-connections.
    fn close_chain(&mut self) -> DriverResult<()>;

    /// Controllable axes of a connected device.
    fn axes(&mut self, address: ChainAddress) -> DriverResult<Vec<AxisId, MAX_AXES>>;

    /// Travel-range bounds of one axis.
    fn travel_range(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<TravelRange>;

    /// Switch the servo control loop on.
    fn enable_servo(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<()>;

    /// Start the reference (homing) move. Returns once the move is started.
    fn home(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<()>;

    /// Whether the axis has an established reference.
    fn is_referenced(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<bool>;

    /// Start an absolute move. Returns once the move is started.
    fn move_absolute(
        &mut self,
        address: ChainAddress,
        axis: &AxisId,
        target: Millimeters,
    ) -> DriverResult<()>;

    /// Current measured position.
    fn position(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<Millimeters>;

    /// Whether the axis has reached its commanded position.
    fn on_target(&mut self, address: ChainAddress, axis: &AxisId) -> DriverResult<bool>;
}
