//! Configuration loading from files (std only).

use std::fs;
use std::path::Path;

use crate::error::{truncated, ConfigError, Result};

use super::SystemConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```rust,ignore
/// use chain_stage::load_config;
///
/// let config = load_config("stage.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| ConfigError::IoError(truncated(&e.to_string())))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<SystemConfig> {
    let config: SystemConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(truncated(e.message())))?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.wait.poll_interval_ms, 10);
        assert_eq!(config.stage.axes.as_array(), [0, 1, 2]);
        assert!(config.descriptor_filter().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[chain]
descriptor_filter = "C-863"

[wait]
poll_interval_ms = 20
timeout_ms = 5000

[homing]
timeout_ms = 90000

[stage.axes]
x = 2
y = 0
z = 1
"#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.descriptor_filter(), Some("C-863"));
        assert_eq!(config.wait.poll_interval_ms, 20);
        assert_eq!(config.wait.timeout(), Some(5000));
        assert_eq!(config.homing.timeout(), Some(90_000));
        assert_eq!(config.stage.axes.as_array(), [2, 0, 1]);
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let result = parse_config("[wait\npoll_interval_ms = 1");
        assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
    }

    #[test]
    fn test_parse_runs_validation() {
        let toml = r#"
[stage.axes]
x = 1
y = 1
z = 2
"#;
        let result = parse_config(toml);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::DuplicateAxisBinding(1)))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/chain-stage.toml");
        assert!(matches!(result, Err(Error::Config(ConfigError::IoError(_)))));
    }
}
