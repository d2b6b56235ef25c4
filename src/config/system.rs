//! System configuration - root configuration structure.

use serde::Deserialize;

use super::chain::{ChainConfig, HomingConfig, WaitConfig};
use super::stage::StageConfig;

/// Root configuration structure from TOML.
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    /// Chain discovery.
    #[serde(default)]
    pub chain: ChainConfig,

    /// On-target polling for moves.
    #[serde(default)]
    pub wait: WaitConfig,

    /// Reference move during open.
    #[serde(default)]
    pub homing: HomingConfig,

    /// Composite stage axis bindings.
    #[serde(default)]
    pub stage: StageConfig,
}

impl SystemConfig {
    /// Enumeration mask, if one is configured.
    pub fn descriptor_filter(&self) -> Option<&str> {
        self.chain.descriptor_filter.as_deref()
    }
}
