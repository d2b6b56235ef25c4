//! Configuration module for chain-stage.
//!
//! Provides types for loading and validating session and stage settings
//! from TOML files (with `std` feature) or pre-parsed data.

mod chain;
#[cfg(feature = "std")]
mod loader;
mod stage;
mod system;
pub mod units;
mod validation;

pub use chain::{
    ChainConfig, HomingConfig, WaitConfig, DEFAULT_HOMING_TIMEOUT_MS, DEFAULT_MOTION_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS,
};
pub use stage::{AxisBindings, StageConfig};
pub use system::SystemConfig;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

pub(crate) use chain::max_polls;

// Re-export unit types at config level
pub use units::{Millimeters, TravelRange};
