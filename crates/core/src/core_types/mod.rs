//! Core types and utilities

pub mod tree;
pub mod units;
pub mod vec2;

pub use tree::*;
pub use units::*;
pub use vec2::{polar_offset, Vec2};
