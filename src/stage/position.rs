//! Three-axis positions.

use core::ops::{Add, Sub};

use crate::config::units::Millimeters;

use super::axis::StageAxis;

/// A point (or offset) in stage coordinates, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position3D {
    /// X coordinate.
    pub x: Millimeters,
    /// Y coordinate.
    pub y: Millimeters,
    /// Z coordinate.
    pub z: Millimeters,
}

impl Position3D {
    /// Create a position from raw millimeter values.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Millimeters(x),
            y: Millimeters(y),
            z: Millimeters(z),
        }
    }

    /// The coordinate for one axis.
    #[inline]
    pub fn get(&self, axis: StageAxis) -> Millimeters {
        match axis {
            StageAxis::X => self.x,
            StageAxis::Y => self.y,
            StageAxis::Z => self.z,
        }
    }

    /// Set the coordinate for one axis.
    #[inline]
    pub fn set(&mut self, axis: StageAxis, value: Millimeters) {
        match axis {
            StageAxis::X => self.x = value,
            StageAxis::Y => self.y = value,
            StageAxis::Z => self.z = value,
        }
    }

    /// Raw values in X, Y, Z order.
    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x.0, self.y.0, self.z.0]
    }

    /// Whether every coordinate lies within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Self, tolerance: Millimeters) -> bool {
        StageAxis::ALL
            .iter()
            .all(|&axis| self.get(axis).approx_eq(other.get(axis), tolerance))
    }
}

impl From<(f64, f64, f64)> for Position3D {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[f64; 3]> for Position3D {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl Add for Position3D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Position3D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}
