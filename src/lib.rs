//! # chain-stage
//!
//! Session management for daisy-chained single-axis linear stages, with an
//! optional 3-axis composite stage on top.
//!
//! ## Features
//!
//! - **Driver-agnostic**: the vendor SDK is bound through the [`ChainDriver`] trait
//! - **Fail-closed open**: discovery, servo and homing of every device, or no session at all
//! - **Scoped connection**: the chain is released on `close()` or drop, exactly once
//! - **Bounded waits**: on-target polling with a configurable timeout
//! - **Composite stage**: X/Y/Z moves issued together, then waited on in order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chain_stage::{CompositeStage, ControllerSession, Position3D};
//!
//! // Load configuration from TOML
//! let config = chain_stage::load_config("stage.toml")?;
//!
//! // Open the chain with a vendor driver binding and a delay provider
//! let session = ControllerSession::open(driver, delay, &config)?;
//! let mut stage = CompositeStage::from_config(session, &config.stage)?;
//!
//! stage.move_absolute_3d(Position3D::new(20.0, 20.0, 20.0), true)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): file loading, TOML parsing and the simulated chain
//! - `defmt`: derives `defmt::Format` on state and axis enums for embedded hosts

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod driver;
pub mod error;
pub mod session;
pub mod stage;

// Re-exports for ergonomic API
pub use config::{validate_config, StageConfig, SystemConfig, WaitConfig};
pub use driver::{AxisId, ChainAddress, ChainDriver, ChainSlot, DriverError, DriverOp};
pub use error::{AxisError, ConfigError, Error, InitStage, Result};
pub use session::{ControllerSession, ControllerSessionBuilder, DeviceHandle, DeviceState};
pub use stage::{AxisMap, CompositeStage, Position3D, StageAxis};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Millimeters, TravelRange};
