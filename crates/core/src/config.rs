//! Cover engine configuration
//!
//! Disk resolution presets trade polygon vertex count against boolean-op
//! cost. Because disks are discretized with equal-area polygons, the
//! resolution changes the shape error along crown edges but never biases
//! the area of an unclipped crown.

use crate::core_types::{Inches, SquareFeet};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest segment count accepted for a disk polygon
pub const MIN_DISK_SEGMENTS: u32 = 8;

/// Disk discretization preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskResolution {
    /// 32 segments per disk
    Coarse,
    /// 64 segments per disk
    #[default]
    Standard,
    /// 128 segments per disk
    Fine,
    /// Explicit segment count
    Custom(u32),
}

impl DiskResolution {
    /// Segment count for this preset
    #[must_use]
    pub const fn segments(&self) -> u32 {
        match self {
            Self::Coarse => 32,
            Self::Standard => 64,
            Self::Fine => 128,
            Self::Custom(n) => *n,
        }
    }

    /// Parse a preset name as used on the command line
    ///
    /// Accepts `coarse`, `standard`, `fine` or a bare segment count.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "coarse" | "low" => Some(Self::Coarse),
            "standard" | "medium" => Some(Self::Standard),
            "fine" | "high" => Some(Self::Fine),
            other => other.parse::<u32>().ok().map(Self::Custom),
        }
    }
}

/// Settings shared by inventory preparation, the cover engine and the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    /// Polygon resolution for crown and subplot disks
    pub disk_resolution: DiskResolution,
    /// Clipped pieces smaller than this are treated as empty
    pub sliver_tolerance: SquareFeet,
    /// Trees below this diameter are excluded before the engine
    pub min_diameter: Inches,
    /// Width of the diameter classes used for crown width imputation
    pub diameter_class_width: Inches,
    /// Dedicated worker pool size; `None` uses the global rayon pool
    pub threads: Option<usize>,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            disk_resolution: DiskResolution::default(),
            sliver_tolerance: SquareFeet::from(1e-6),
            min_diameter: Inches::from(5.0),
            diameter_class_width: Inches::from(2.0),
            threads: None,
        }
    }
}

impl CoverConfig {
    /// Check every field
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let segments = self.disk_resolution.segments();
        if segments < MIN_DISK_SEGMENTS {
            return Err(ConfigError::TooFewSegments {
                got: segments,
                min: MIN_DISK_SEGMENTS,
            });
        }
        let tol = self.sliver_tolerance.value();
        if !tol.is_finite() || tol < 0.0 {
            return Err(ConfigError::InvalidSliverTolerance(tol));
        }
        let min_dia = self.min_diameter.value();
        if !min_dia.is_finite() || min_dia < 0.0 {
            return Err(ConfigError::InvalidMinDiameter(min_dia));
        }
        let class_width = self.diameter_class_width.value();
        if !class_width.is_finite() || class_width <= 0.0 {
            return Err(ConfigError::InvalidClassWidth(class_width));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }

    /// Load and validate a JSON config file
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}
