//! Plot and tree identity types shared by every stage of the pipeline

use crate::core_types::units::{Degrees, Feet, Inches};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique plot key (`PLT_CN` in FIA tables)
///
/// Kept as an opaque string: control numbers exceed what downstream tools
/// round-trip safely as numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotKey(String);

impl PlotKey {
    /// Create a plot key
    pub fn new(key: impl Into<String>) -> Self {
        PlotKey(key.into())
    }

    /// Borrow the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlotKey {
    fn from(s: &str) -> Self {
        PlotKey(s.to_owned())
    }
}

impl From<String> for PlotKey {
    fn from(s: String) -> Self {
        PlotKey(s)
    }
}

impl fmt::Display for PlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Species code (`SPCD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesCode(pub u16);

impl fmt::Display for SpeciesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SPCD {}", self.0)
    }
}

/// Tree status (`STATUSCD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStatus {
    /// Live tree (code 1)
    Live,
    /// Standing dead tree (code 2)
    Dead,
    /// Removed by harvest or land use change (code 3)
    Removed,
    /// No status recorded (code 0 or anything unknown)
    Unknown,
}

impl TreeStatus {
    /// Decode an inventory status code
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TreeStatus::Live,
            2 => TreeStatus::Dead,
            3 => TreeStatus::Removed,
            _ => TreeStatus::Unknown,
        }
    }

    /// Only live trees contribute canopy
    pub fn is_live(self) -> bool {
        matches!(self, TreeStatus::Live)
    }
}

/// A tree ready for the cover engine
///
/// Produced by inventory preparation once status, diameter and crown width
/// have been checked. Location is still the raw stem-map triple; placement
/// turns it into a plot-local coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Tree identifier, unique within its plot
    pub id: u64,
    /// Subplot number (1-4)
    pub subplot: u8,
    /// Horizontal distance from subplot center
    pub distance: Feet,
    /// Bearing from subplot center, clockwise from north
    pub azimuth: Degrees,
    /// Species code
    pub species: SpeciesCode,
    /// Diameter at breast height
    pub diameter: Inches,
    /// Predicted (or imputed) crown width
    pub crown_width: Feet,
    /// Trees-per-acre expansion factor (`TPA_UNADJ`)
    pub tpa: f64,
}

impl Tree {
    /// Crown radius, half the crown width
    pub fn crown_radius(&self) -> Feet {
        self.crown_width / 2.0
    }
}
