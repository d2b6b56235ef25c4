//! Controller session module for chain-stage.
//!
//! Owns the daisy-chain connection, initializes every chained device and
//! provides per-device move, query and wait primitives.

mod builder;
mod controller;
mod device;
pub mod state;
mod wait;

pub use builder::ControllerSessionBuilder;
pub use controller::ControllerSession;
pub use device::{AxisInfo, DeviceHandle};
pub use state::DeviceState;
