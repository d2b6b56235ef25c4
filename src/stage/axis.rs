//! Logical stage axes and their binding to session devices.

use core::fmt;
use core::str::FromStr;

use crate::config::AxisBindings;
use crate::error::{truncated, AxisError, ConfigError, Error, Result};

/// A logical axis of the composite stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StageAxis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl StageAxis {
    /// All axes in issue and wait order.
    pub const ALL: [StageAxis; 3] = [StageAxis::X, StageAxis::Y, StageAxis::Z];

    /// Position of the axis in [`StageAxis::ALL`].
    #[inline]
    pub fn ordinal(self) -> usize {
        match self {
            StageAxis::X => 0,
            StageAxis::Y => 1,
            StageAxis::Z => 2,
        }
    }

    /// Axis name for display/debugging.
    pub fn name(self) -> &'static str {
        match self {
            StageAxis::X => "x",
            StageAxis::Y => "y",
            StageAxis::Z => "z",
        }
    }
}

impl fmt::Display for StageAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("x") {
            Ok(StageAxis::X)
        } else if s.eq_ignore_ascii_case("y") {
            Ok(StageAxis::Y)
        } else if s.eq_ignore_ascii_case("z") {
            Ok(StageAxis::Z)
        } else {
            Err(AxisError::UnknownName(truncated(s)).into())
        }
    }
}

/// Immutable mapping from logical axis to session device index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMap {
    indices: [usize; 3],
}

impl Default for AxisMap {
    fn default() -> Self {
        Self { indices: [0, 1, 2] }
    }
}

impl AxisMap {
    /// Build a map from device indices in X, Y, Z order.
    ///
    /// # Errors
    ///
    /// Returns an error if two axes share a device.
    pub fn new(x: usize, y: usize, z: usize) -> Result<Self> {
        Self::from_bindings(&AxisBindings { x, y, z })
    }

    /// Build a map from configured bindings.
    pub fn from_bindings(bindings: &AxisBindings) -> Result<Self> {
        if let Some(index) = bindings.duplicate() {
            return Err(ConfigError::DuplicateAxisBinding(index).into());
        }
        Ok(Self {
            indices: bindings.as_array(),
        })
    }

    /// Device index bound to `axis`.
    #[inline]
    pub fn device_index(&self, axis: StageAxis) -> usize {
        self.indices[axis.ordinal()]
    }

    /// Largest bound device index.
    #[inline]
    pub fn max_index(&self) -> usize {
        self.indices.iter().copied().max().unwrap_or(0)
    }

    /// `(axis, device index)` pairs in X, Y, Z order.
    pub fn iter(&self) -> impl Iterator<Item = (StageAxis, usize)> + '_ {
        StageAxis::ALL.iter().map(move |&axis| (axis, self.device_index(axis)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_names() {
        assert_eq!("x".parse::<StageAxis>().unwrap(), StageAxis::X);
        assert_eq!("Y".parse::<StageAxis>().unwrap(), StageAxis::Y);
        assert_eq!("z".parse::<StageAxis>().unwrap(), StageAxis::Z);
        assert!(matches!(
            "w".parse::<StageAxis>(),
            Err(Error::InvalidAxis(AxisError::UnknownName(_)))
        ));
    }

    #[test]
    fn test_axis_map_lookup() {
        let map = AxisMap::new(2, 0, 1).unwrap();
        assert_eq!(map.device_index(StageAxis::X), 2);
        assert_eq!(map.device_index(StageAxis::Y), 0);
        assert_eq!(map.max_index(), 2);

        let pairs: heapless::Vec<_, 3> = map.iter().collect();
        assert_eq!(
            pairs.as_slice(),
            &[(StageAxis::X, 2), (StageAxis::Y, 0), (StageAxis::Z, 1)]
        );
    }

    #[test]
    fn test_axis_map_rejects_shared_device() {
        assert!(matches!(
            AxisMap::new(0, 1, 0),
            Err(Error::Config(ConfigError::DuplicateAxisBinding(0)))
        ));
    }
}
