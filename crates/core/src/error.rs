//! Error and diagnostic types
//!
//! Problems are resolved at the smallest granularity that makes sense:
//! a bad tree is dropped with a [`TreeRejection`], a plot whose geometry
//! fails is dropped with a [`CoverError`], and neither stops the batch.
//! [`ConfigError`] is the only error that aborts before any work starts.

use crate::core_types::{PlotKey, TreeStatus};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid configuration, detected before any plot is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Disk discretization too coarse to approximate a circle
    #[error("disk resolution must use at least {min} segments, got {got}")]
    TooFewSegments {
        /// Requested segment count
        got: u32,
        /// Smallest accepted segment count
        min: u32,
    },

    /// Sliver tolerance negative or not finite
    #[error("sliver tolerance must be finite and non-negative, got {0}")]
    InvalidSliverTolerance(f64),

    /// Minimum diameter negative or not finite
    #[error("minimum diameter must be finite and non-negative, got {0}")]
    InvalidMinDiameter(f64),

    /// Diameter class width zero, negative or not finite
    #[error("diameter class width must be finite and positive, got {0}")]
    InvalidClassWidth(f64),

    /// Dedicated pool requested with zero workers
    #[error("thread count must be at least 1")]
    ZeroThreads,

    /// Rayon refused to build the worker pool
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::CoverConfig`]
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single tree was kept out of the cover computation
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", content = "value", rename_all = "snake_case")]
pub enum TreeRejection {
    /// Subplot number does not resolve to a subplot center
    #[error("subplot {0} is not one of 1-4")]
    UnknownSubplot(u8),

    /// Distance from subplot center negative or not finite
    #[error("distance {0} is negative or not finite")]
    InvalidDistance(f64),

    /// Azimuth outside `[0, 360)`
    #[error("azimuth {0} is outside [0, 360)")]
    InvalidAzimuth(f64),

    /// Crown width missing after imputation, non-positive or not finite
    #[error("crown width {0:?} is missing, non-positive or not finite")]
    InvalidCrownWidth(Option<f64>),

    /// Crown crosses the plot edge from too far away to clip precisely
    #[error("crown straddles the plot edge but reaches {0} ft from the plot center")]
    BeyondClipRange(f64),

    /// Diameter non-positive or not finite
    #[error("diameter {0} is non-positive or not finite")]
    InvalidDiameter(f64),

    /// Diameter below the inventory threshold
    #[error("diameter {diameter} is below the {minimum} minimum")]
    BelowMinimumDiameter {
        /// Measured diameter (inches)
        diameter: f64,
        /// Configured threshold (inches)
        minimum: f64,
    },

    /// Dead, removed or unknown status
    #[error("tree status is {0:?}, only live trees carry canopy")]
    NotLive(TreeStatus),
}

/// Plot-level failure inside the cover engine
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CoverError {
    /// An area came back NaN or infinite
    #[error("{quantity} is not finite ({value})")]
    NonFiniteArea {
        /// Which accumulated quantity went bad
        quantity: &'static str,
        /// The offending value
        value: f64,
    },

    /// The polygon engine panicked; the payload message is kept
    #[error("geometry engine panicked: {0}")]
    EnginePanic(String),

    /// Batch was cancelled before this plot started
    #[error("batch cancelled before the plot was processed")]
    Cancelled,
}

/// A rejected tree, with enough context to find it in the source data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeDiagnostic {
    /// Plot the tree belongs to
    pub plot: PlotKey,
    /// Tree identifier
    pub tree_id: u64,
    /// Why it was rejected
    pub reason: TreeRejection,
}

/// A plot excluded from the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotDiagnostic {
    /// Plot that failed
    pub plot: PlotKey,
    /// What went wrong
    pub error: CoverError,
}
