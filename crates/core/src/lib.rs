//! Canopy Cover Core Library
//!
//! Estimates percent canopy cover for four-subplot forest inventory plots
//! from stem-mapped trees. Each crown is a disk clipped to the sampled
//! area; overlapping crowns are dissolved so shared ground counts once.
//!
//! ## Pipeline
//!
//! - [`inventory`]: filter raw records, fill crown widths, group by plot
//! - [`layout`]: subplot centers and the sampled-area boundary
//! - [`placement`]: stem-map coordinates from distance and azimuth
//! - [`cover`]: clipped crown footprints and cover statistics
//! - [`batch`]: parallel per-plot runs collected into a [`CoverTable`]
//!
//! Supporting modules: [`geometry`] (disks and polygon booleans),
//! [`density`] (per-acre stand attributes), [`sampling`] (seeded plot
//! selection), [`config`] and [`error`].

// Core types and utilities
pub mod core_types;
pub mod geometry;

// Configuration and errors
pub mod config;
pub mod error;

// Per-plot pipeline
pub mod cover;
pub mod layout;
pub mod placement;

// Batch and tables
pub mod batch;
pub mod table;

// Inventory-side helpers
pub mod density;
pub mod inventory;
pub mod sampling;

// Re-export core types
pub use core_types::{
    Degrees, Feet, Inches, PlotKey, SpeciesCode, SquareFeet, Tree, TreeStatus, Vec2,
};

pub use batch::{BatchProcessor, BatchReport, BatchSummary, CancelToken};
pub use config::{CoverConfig, DiskResolution};
pub use cover::{CoverDetail, CoverEngine, CoverStats, CrownFootprint, PlotOutcome};
pub use density::StandDensity;
pub use error::{ConfigError, CoverError, PlotDiagnostic, TreeDiagnostic, TreeRejection};
pub use geometry::{DiskBuilder, Region};
pub use inventory::{
    prepare_inventory, CrownWidthModel, FnCrownWidthModel, PlotRecord, PlotStatus,
    PreparedInventory, TreeRecord,
};
pub use layout::{DiskPlacement, PlotLayout};
pub use placement::{place_tree, PlacedTree};
pub use sampling::{select_plots, train_validation_split, PlotSplit};
pub use table::CoverTable;
