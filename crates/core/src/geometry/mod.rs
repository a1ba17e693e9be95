//! Planar geometry for crown and subplot footprints
//!
//! Contains:
//! - Equal-area disk discretization
//! - Multi-part regions with intersection, union and dissolve

pub mod disk;
pub mod region;

pub use disk::DiskBuilder;
pub use region::Region;
