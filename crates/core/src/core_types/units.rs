//! Semantic unit types for plot geometry and tree measurements
//!
//! Forest inventory data mixes feet (distances, crown widths), inches (stem
//! diameters) and degrees (azimuths). Newtype wrappers keep those from being
//! swapped by accident at call sites that take several `f64` arguments.
//!
//! # Design Philosophy
//! - All types wrap `f64`; the polygon engine works in `f64` end to end
//! - Total ordering via `Ord` (NaN handled as greater than all values)
//! - `new` asserts the physical constraint, `From<f64>` does not, so raw
//!   records can carry bad values until validation rejects them
//! - Serde support for serialization (transparent, plain numbers on the wire)
//!
//! # Usage
//! ```
//! use canopy_cover_core::core_types::units::{Feet, SquareFeet};
//!
//! let width = Feet::new(20.0);
//! let radius = width / 2.0;
//! assert_eq!(*radius, 10.0);
//!
//! let area = SquareFeet::new(43_560.0);
//! assert!((area.to_acres() - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Deref, Div, Mul, Sub};

/// Square feet in one acre
pub const SQUARE_FEET_PER_ACRE: f64 = 43_560.0;

/// Inches per foot
const INCHES_PER_FOOT: f64 = 12.0;

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// LENGTH TYPES
// ============================================================================

/// Horizontal distance in feet
///
/// Used for subplot offsets, tree distances and crown widths.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Feet(f64);

impl Eq for Feet {}

impl PartialOrd for Feet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Feet {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Feet {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Feet {
    /// Zero distance
    pub const ZERO: Feet = Feet(0.0);

    /// Create a new distance in feet. Asserts value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "Feet::new: distance must be finite and non-negative"
        );
        Feet(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// True when the distance is finite and strictly positive
    #[inline]
    #[must_use]
    pub fn is_positive_finite(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl From<f64> for Feet {
    fn from(v: f64) -> Self {
        Feet(v)
    }
}

impl From<Feet> for f64 {
    fn from(f: Feet) -> f64 {
        f.0
    }
}

impl Add for Feet {
    type Output = Feet;
    fn add(self, rhs: Feet) -> Feet {
        Feet(self.0 + rhs.0)
    }
}

impl Sub for Feet {
    type Output = Feet;
    fn sub(self, rhs: Feet) -> Feet {
        Feet(self.0 - rhs.0)
    }
}

impl Mul<f64> for Feet {
    type Output = Feet;
    fn mul(self, rhs: f64) -> Feet {
        Feet(self.0 * rhs)
    }
}

impl Div<f64> for Feet {
    type Output = Feet;
    fn div(self, rhs: f64) -> Feet {
        Feet(self.0 / rhs)
    }
}

// Cross-type operation: length * length = area
impl Mul<Feet> for Feet {
    type Output = SquareFeet;
    fn mul(self, rhs: Feet) -> SquareFeet {
        SquareFeet(self.0 * rhs.0)
    }
}

impl fmt::Display for Feet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ft", self.0)
    }
}

/// Stem diameter in inches
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Inches(f64);

impl Eq for Inches {}

impl PartialOrd for Inches {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Inches {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Inches {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Inches {
    /// Create a new diameter. Asserts value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "Inches::new: diameter must be finite and non-negative"
        );
        Inches(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to feet
    #[inline]
    #[must_use]
    pub fn to_feet(self) -> Feet {
        Feet(self.0 / INCHES_PER_FOOT)
    }
}

impl From<f64> for Inches {
    fn from(v: f64) -> Self {
        Inches(v)
    }
}

impl From<Inches> for f64 {
    fn from(i: Inches) -> f64 {
        i.0
    }
}

impl fmt::Display for Inches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} in", self.0)
    }
}

// ============================================================================
// AREA TYPES
// ============================================================================

/// Horizontal area in square feet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct SquareFeet(f64);

impl Eq for SquareFeet {}

impl PartialOrd for SquareFeet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SquareFeet {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for SquareFeet {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl SquareFeet {
    /// Zero area
    pub const ZERO: SquareFeet = SquareFeet(0.0);

    /// Create a new area. Asserts value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "SquareFeet::new: area must be finite and non-negative"
        );
        SquareFeet(value)
    }

    /// Area of a circle with the given radius
    #[inline]
    #[must_use]
    pub fn of_circle(radius: Feet) -> Self {
        SquareFeet(std::f64::consts::PI * radius.0 * radius.0)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to acres
    #[inline]
    #[must_use]
    pub fn to_acres(self) -> f64 {
        self.0 / SQUARE_FEET_PER_ACRE
    }

    /// Ratio of this area to another, `None` when the denominator is zero
    #[inline]
    #[must_use]
    pub fn ratio_to(self, whole: SquareFeet) -> Option<f64> {
        if whole.0 > 0.0 {
            Some(self.0 / whole.0)
        } else {
            None
        }
    }
}

impl From<f64> for SquareFeet {
    fn from(v: f64) -> Self {
        SquareFeet(v)
    }
}

impl From<SquareFeet> for f64 {
    fn from(a: SquareFeet) -> f64 {
        a.0
    }
}

impl Add for SquareFeet {
    type Output = SquareFeet;
    fn add(self, rhs: SquareFeet) -> SquareFeet {
        SquareFeet(self.0 + rhs.0)
    }
}

impl AddAssign for SquareFeet {
    fn add_assign(&mut self, rhs: SquareFeet) {
        self.0 += rhs.0;
    }
}

impl Sub for SquareFeet {
    type Output = SquareFeet;
    fn sub(self, rhs: SquareFeet) -> SquareFeet {
        SquareFeet(self.0 - rhs.0)
    }
}

impl Mul<f64> for SquareFeet {
    type Output = SquareFeet;
    fn mul(self, rhs: f64) -> SquareFeet {
        SquareFeet(self.0 * rhs)
    }
}

impl Sum for SquareFeet {
    fn sum<I: Iterator<Item = SquareFeet>>(iter: I) -> SquareFeet {
        SquareFeet(iter.map(|a| a.0).sum())
    }
}

impl fmt::Display for SquareFeet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ft²", self.0)
    }
}

// ============================================================================
// ANGLE TYPES
// ============================================================================

/// Compass bearing in degrees, clockwise from north
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(f64);

impl Eq for Degrees {}

impl PartialOrd for Degrees {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Degrees {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Degrees {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Degrees {
    /// North
    pub const NORTH: Degrees = Degrees(0.0);

    /// Create a new bearing in degrees
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }

    /// True for a finite bearing in `[0, 360)`
    #[inline]
    #[must_use]
    pub fn is_compass_bearing(self) -> bool {
        self.0.is_finite() && (0.0..360.0).contains(&self.0)
    }
}

impl From<f64> for Degrees {
    fn from(v: f64) -> Self {
        Degrees(v)
    }
}

impl From<Degrees> for f64 {
    fn from(d: Degrees) -> f64 {
        d.0
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°", self.0)
    }
}
