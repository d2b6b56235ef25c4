//! Composite stage configuration.

use serde::Deserialize;

/// Binding of the logical X, Y and Z axes to session device indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AxisBindings {
    /// Device index driving X.
    pub x: usize,
    /// Device index driving Y.
    pub y: usize,
    /// Device index driving Z.
    pub z: usize,
}

impl Default for AxisBindings {
    fn default() -> Self {
        Self { x: 0, y: 1, z: 2 }
    }
}

impl AxisBindings {
    /// Indices in X, Y, Z order.
    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }

    /// First device index bound to more than one axis, if any.
    pub fn duplicate(&self) -> Option<usize> {
        let [x, y, z] = self.as_array();
        if x == y || x == z {
            Some(x)
        } else if y == z {
            Some(y)
        } else {
            None
        }
    }
}

/// Stage section of the configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StageConfig {
    /// Axis to device bindings.
    #[serde(default)]
    pub axes: AxisBindings,
}
