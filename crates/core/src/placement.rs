//! Stem-map placement
//!
//! Turns a tree's `(subplot, distance, azimuth)` triple into a plot-local
//! coordinate: subplot center plus the polar offset.

use crate::core_types::{polar_offset, Feet, PlotKey, Tree, Vec2};
use crate::error::{TreeDiagnostic, TreeRejection};
use crate::layout::{DiskPlacement, PlotLayout};
use tracing::warn;

/// Farthest a clipped crown may reach from subplot 1 (ft)
///
/// The polygon overlay snaps to a grid scaled to its inputs' extent; past
/// this the snapping error is no longer small against a subplot.
pub const MAX_CLIP_EXTENT_FT: f64 = 10_000.0;

/// A tree resolved to a plot-local position
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedTree {
    /// Tree identifier
    pub id: u64,
    /// Stem position (ft, `x` east, `y` north)
    pub position: Vec2,
    /// Crown diameter
    pub crown_width: Feet,
}

impl PlacedTree {
    /// Crown radius, half the crown width
    pub fn crown_radius(&self) -> Feet {
        self.crown_width / 2.0
    }
}

/// Place a single tree
///
/// # Errors
/// Returns the first failed check: unknown subplot, negative or non-finite
/// distance, azimuth outside `[0, 360)`, a crown width that is not
/// positive and finite, or a crown that straddles the boundary from beyond
/// [`MAX_CLIP_EXTENT_FT`]. Crowns that cover every subplot are never
/// rejected for their size.
pub fn place_tree(layout: &PlotLayout, tree: &Tree) -> Result<PlacedTree, TreeRejection> {
    let center = layout
        .center(tree.subplot)
        .ok_or(TreeRejection::UnknownSubplot(tree.subplot))?;

    let distance = tree.distance.value();
    if !distance.is_finite() || distance < 0.0 {
        return Err(TreeRejection::InvalidDistance(distance));
    }
    if !tree.azimuth.is_compass_bearing() {
        return Err(TreeRejection::InvalidAzimuth(tree.azimuth.value()));
    }
    if !tree.crown_width.is_positive_finite() {
        return Err(TreeRejection::InvalidCrownWidth(Some(
            tree.crown_width.value(),
        )));
    }

    let placed = PlacedTree {
        id: tree.id,
        position: center + polar_offset(distance, tree.azimuth.value()),
        crown_width: tree.crown_width,
    };
    let radius = placed.crown_radius();
    let extent = placed.position.norm() + layout.disks().circumradius(radius.value());
    if extent > MAX_CLIP_EXTENT_FT
        && layout.classify_disk(placed.position, radius) == DiskPlacement::Straddles
    {
        return Err(TreeRejection::BeyondClipRange(extent));
    }

    Ok(placed)
}

/// Place every tree of one plot
///
/// Trees that fail validation are left out and reported; the rest keep
/// their input order.
pub fn place_trees(
    layout: &PlotLayout,
    plot: &PlotKey,
    trees: &[Tree],
) -> (Vec<PlacedTree>, Vec<TreeDiagnostic>) {
    let mut placed = Vec::with_capacity(trees.len());
    let mut rejected = Vec::new();

    for tree in trees {
        match place_tree(layout, tree) {
            Ok(p) => placed.push(p),
            Err(reason) => {
                warn!(plot = %plot, tree = tree.id, %reason, "Excluding tree");
                rejected.push(TreeDiagnostic {
                    plot: plot.clone(),
                    tree_id: tree.id,
                    reason,
                });
            }
        }
    }

    (placed, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Degrees, Inches, SpeciesCode};
    use approx::assert_abs_diff_eq;

    fn tree(subplot: u8, distance: f64, azimuth: f64) -> Tree {
        Tree {
            id: 7,
            subplot,
            distance: Feet::from(distance),
            azimuth: Degrees::new(azimuth),
            species: SpeciesCode(122),
            diameter: Inches::new(10.0),
            crown_width: Feet::new(15.0),
            tpa: 6.018,
        }
    }

    #[test]
    fn test_subplot_center_tree() {
        let layout = PlotLayout::standard();
        let p = place_tree(&layout, &tree(2, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(p.position.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.position.y, 120.0, epsilon = 1e-9);
        assert_eq!(p.crown_radius(), Feet::new(7.5));
    }

    #[test]
    fn test_offset_from_subplot_center() {
        let layout = PlotLayout::standard();
        let p = place_tree(&layout, &tree(1, 10.0, 90.0)).unwrap();
        assert_abs_diff_eq!(p.position.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.position.y, 0.0, epsilon = 1e-9);

        let p = place_tree(&layout, &tree(2, 10.0, 180.0)).unwrap();
        assert_abs_diff_eq!(p.position.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.position.y, 110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejections() {
        let layout = PlotLayout::standard();
        assert_eq!(
            place_tree(&layout, &tree(5, 1.0, 0.0)),
            Err(TreeRejection::UnknownSubplot(5))
        );
        assert_eq!(
            place_tree(&layout, &tree(1, -1.0, 0.0)),
            Err(TreeRejection::InvalidDistance(-1.0))
        );
        assert_eq!(
            place_tree(&layout, &tree(1, 1.0, 360.0)),
            Err(TreeRejection::InvalidAzimuth(360.0))
        );

        let mut t = tree(1, 1.0, 0.0);
        t.crown_width = Feet::from(f64::INFINITY);
        assert!(matches!(
            place_tree(&layout, &t),
            Err(TreeRejection::InvalidCrownWidth(_))
        ));
    }

    #[test]
    fn test_far_straddling_crown_is_rejected() {
        let layout = PlotLayout::standard();

        // A million feet north with a crown just reaching back to subplot 1
        let mut t = tree(1, 1e6, 0.0);
        t.crown_width = Feet::new(2e6);
        assert!(matches!(
            place_tree(&layout, &t),
            Err(TreeRejection::BeyondClipRange(extent)) if extent > MAX_CLIP_EXTENT_FT
        ));

        // Same distance, crown far short of the plot
        t.crown_width = Feet::new(50.0);
        assert!(place_tree(&layout, &t).is_ok());

        // Huge crown over the whole plot
        let mut t = tree(1, 2.0, 0.0);
        t.crown_width = Feet::new(1e12);
        assert!(place_tree(&layout, &t).is_ok());
    }

    #[test]
    fn test_place_trees_keeps_good_trees() {
        let layout = PlotLayout::standard();
        let plot = PlotKey::from("42");
        let trees = vec![tree(1, 1.0, 0.0), tree(9, 1.0, 0.0), tree(3, 5.0, 45.0)];
        let (placed, rejected) = place_trees(&layout, &plot, &trees);
        assert_eq!(placed.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].plot, plot);
        assert_eq!(rejected[0].reason, TreeRejection::UnknownSubplot(9));
    }
}
