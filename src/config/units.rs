//! Unit types for physical quantities.
//!
//! Stage positions are linear and reported by the controllers in millimeters.

use core::fmt;
use core::ops::{Add, Neg, Sub};

use serde::Deserialize;

/// Linear position or distance in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Absolute distance between two positions.
    #[inline]
    pub fn distance(self, other: Self) -> Self {
        let d = self.0 - other.0;
        Self(if d < 0.0 { -d } else { d })
    }

    /// Check whether `other` lies within `tolerance` of this value.
    #[inline]
    pub fn approx_eq(self, other: Self, tolerance: Self) -> bool {
        self.distance(other).0 <= tolerance.0
    }
}

impl From<f64> for Millimeters {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Add for Millimeters {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Millimeters {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mm", self.0)
    }
}

/// Travel range of one axis, as reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TravelRange {
    /// Lower travel bound.
    pub min: Millimeters,
    /// Upper travel bound.
    pub max: Millimeters,
}

impl TravelRange {
    /// Create a new travel range.
    #[inline]
    pub const fn new(min: Millimeters, max: Millimeters) -> Self {
        Self { min, max }
    }

    /// Check if a position lies within the range (inclusive).
    #[inline]
    pub fn contains(&self, position: Millimeters) -> bool {
        position.0 >= self.min.0 && position.0 <= self.max.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millimeter_arithmetic() {
        let a = Millimeters(12.5);
        let b = Millimeters(2.5);

        assert_eq!((a + b).value(), 15.0);
        assert_eq!((a - b).value(), 10.0);
        assert_eq!((-a).value(), -12.5);
        assert_eq!(b.distance(a).value(), 10.0);
    }

    #[test]
    fn test_approx_eq() {
        let tol = Millimeters(0.001);
        assert!(Millimeters(20.0).approx_eq(Millimeters(20.0005), tol));
        assert!(!Millimeters(20.0).approx_eq(Millimeters(20.01), tol));
    }

    #[test]
    fn test_travel_range() {
        let range = TravelRange::new(Millimeters(0.0), Millimeters(25.0));

        assert!(range.contains(Millimeters(0.0)));
        assert!(range.contains(Millimeters(25.0)));
        assert!(!range.contains(Millimeters(-0.1)));
        assert!(!range.contains(Millimeters(25.1)));
    }
}
