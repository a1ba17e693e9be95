//! Fixed four-subplot plot design
//!
//! Every plot uses the same cluster: subplot 1 at the origin and subplots
//! 2-4 at 120 ft on bearings 0°, 120° and 240°, each a 24 ft radius disk.
//! All geometry is plot-local (`x` east, `y` north, feet), so the cluster's
//! georeference never enters the computation.

use crate::core_types::{polar_offset, Feet, SquareFeet, Vec2};
use crate::geometry::{DiskBuilder, Region};
use tracing::debug;

/// Subplot disk radius (ft)
pub const SUBPLOT_RADIUS_FT: f64 = 24.0;

/// Distance from the cluster center to subplots 2-4 (ft)
pub const SUBPLOT_SPACING_FT: f64 = 120.0;

/// Valid subplot numbers
pub const SUBPLOT_IDS: [u8; 4] = [1, 2, 3, 4];

/// `(distance ft, azimuth deg)` of each subplot center from subplot 1
const SUBPLOT_POLAR: [(f64, f64); 4] = [
    (0.0, 0.0),
    (SUBPLOT_SPACING_FT, 0.0),
    (SUBPLOT_SPACING_FT, 120.0),
    (SUBPLOT_SPACING_FT, 240.0),
];

/// Center of subplot `id`, or `None` when `id` is not 1-4
#[must_use]
pub fn subplot_center(id: u8) -> Option<Vec2> {
    let index = usize::from(id).checked_sub(1)?;
    let &(distance, azimuth) = SUBPLOT_POLAR.get(index)?;
    Some(polar_offset(distance, azimuth))
}

/// Area of four disjoint subplot disks, `4·π·24²`
#[must_use]
pub fn nominal_sampled_area() -> SquareFeet {
    SquareFeet::of_circle(Feet::new(SUBPLOT_RADIUS_FT)) * 4.0
}

/// Where a crown disk sits relative to the sampled area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskPlacement {
    /// Entirely inside the given subplot; clipping is a no-op
    Inside(u8),
    /// Clear of every subplot; the clipped footprint is empty
    Outside,
    /// Contains every subplot; the clipped footprint is the whole boundary
    Covers,
    /// Crosses a subplot edge and must be clipped
    Straddles,
}

/// Subplot centers and the dissolved sampled-area boundary
#[derive(Debug, Clone)]
pub struct PlotLayout {
    centers: [Vec2; 4],
    boundary: Region,
    sampled_area: SquareFeet,
    /// Every point of a subplot polygon is within this of its center
    subplot_outer: f64,
    /// Every point this close to a subplot center is inside its polygon
    subplot_inner: f64,
    disks: DiskBuilder,
}

impl PlotLayout {
    /// Build the layout with subplot disks discretized by `disks`
    pub fn new(disks: &DiskBuilder) -> Self {
        let centers = SUBPLOT_POLAR.map(|(d, az)| polar_offset(d, az));
        let radius = Feet::new(SUBPLOT_RADIUS_FT);

        let lobes: Vec<Region> = centers
            .iter()
            .map(|c| Region::from_polygon(disks.disk(*c, radius)))
            .collect();
        // No tolerance here: the lobes are far larger than any sliver
        let boundary = Region::dissolve(&lobes, SquareFeet::ZERO);
        let sampled_area = boundary.area();

        debug!(
            segments = disks.segments(),
            lobes = boundary.part_count(),
            sampled_area = sampled_area.value(),
            "Built plot layout"
        );

        Self {
            centers,
            boundary,
            sampled_area,
            subplot_outer: disks.circumradius(SUBPLOT_RADIUS_FT),
            subplot_inner: disks.inradius(SUBPLOT_RADIUS_FT),
            disks: *disks,
        }
    }

    /// Layout at the default disk resolution
    pub fn standard() -> Self {
        Self::new(&DiskBuilder::new(
            crate::config::DiskResolution::default().segments(),
        ))
    }

    /// Center of subplot `id`, or `None` when `id` is not 1-4
    pub fn center(&self, id: u8) -> Option<Vec2> {
        let index = usize::from(id).checked_sub(1)?;
        self.centers.get(index).copied()
    }

    /// All four subplot centers in subplot order
    pub fn centers(&self) -> &[Vec2; 4] {
        &self.centers
    }

    /// Union of the four subplot disks
    pub fn boundary(&self) -> &Region {
        &self.boundary
    }

    /// Area of the boundary, the denominator of every cover fraction
    pub fn sampled_area(&self) -> SquareFeet {
        self.sampled_area
    }

    /// Subplot disk radius
    pub fn subplot_radius(&self) -> Feet {
        Feet::new(SUBPLOT_RADIUS_FT)
    }

    /// Disk discretization shared by subplots and crowns
    pub fn disks(&self) -> &DiskBuilder {
        &self.disks
    }

    /// Classify the polygon for a disk at `center` with nominal `radius`
    ///
    /// Uses polygon circumradius and inradius bounds so that `Inside`,
    /// `Covers` and `Outside` are exact for the discretized shapes, not just
    /// for ideal circles. Anything in between is `Straddles`.
    pub fn classify_disk(&self, center: Vec2, radius: Feet) -> DiskPlacement {
        let reach = self.disks.circumradius(radius.value());
        let inner_reach = self.disks.inradius(radius.value());
        if self
            .centers
            .iter()
            .all(|c| (center - c).norm() + self.subplot_outer <= inner_reach)
        {
            return DiskPlacement::Covers;
        }

        let mut touches_any = false;
        for (id, c) in SUBPLOT_IDS.iter().zip(&self.centers) {
            let d = (center - c).norm();
            if d + reach <= self.subplot_inner {
                return DiskPlacement::Inside(*id);
            }
            if d < self.subplot_outer + reach {
                touches_any = true;
            }
        }
        if touches_any {
            DiskPlacement::Straddles
        } else {
            DiskPlacement::Outside
        }
    }
}

impl Default for PlotLayout {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_subplot_centers() {
        let c1 = subplot_center(1).unwrap();
        assert_abs_diff_eq!(c1.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c1.y, 0.0, epsilon = 1e-12);

        let c2 = subplot_center(2).unwrap();
        assert_abs_diff_eq!(c2.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c2.y, 120.0, epsilon = 1e-9);

        // 120° is east-south-east of the cluster center
        let c3 = subplot_center(3).unwrap();
        assert_abs_diff_eq!(c3.x, 120.0 * (3.0_f64).sqrt() / 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c3.y, -60.0, epsilon = 1e-9);

        let c4 = subplot_center(4).unwrap();
        assert_abs_diff_eq!(c4.x, -c3.x, epsilon = 1e-9);
        assert_abs_diff_eq!(c4.y, -60.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_subplot() {
        assert!(subplot_center(0).is_none());
        assert!(subplot_center(5).is_none());
        assert!(PlotLayout::standard().center(0).is_none());
    }

    #[test]
    fn test_boundary_has_four_disjoint_lobes() {
        let layout = PlotLayout::standard();
        assert_eq!(layout.boundary().part_count(), 4);
    }

    #[test]
    fn test_sampled_area_matches_four_disks() {
        for segments in [32, 64, 128] {
            let layout = PlotLayout::new(&DiskBuilder::new(segments));
            assert_relative_eq!(
                layout.sampled_area().value(),
                nominal_sampled_area().value(),
                max_relative = 1e-6
            );
        }
        assert_relative_eq!(nominal_sampled_area().value(), 7238.229, epsilon = 1e-3);
    }

    #[test]
    fn test_classify_disk() {
        let layout = PlotLayout::standard();
        assert_eq!(
            layout.classify_disk(Vec2::zeros(), Feet::new(10.0)),
            DiskPlacement::Inside(1)
        );
        assert_eq!(
            layout.classify_disk(Vec2::new(0.0, 125.0), Feet::new(5.0)),
            DiskPlacement::Inside(2)
        );
        assert_eq!(
            layout.classify_disk(Vec2::new(0.0, 60.0), Feet::new(10.0)),
            DiskPlacement::Outside
        );
        assert_eq!(
            layout.classify_disk(Vec2::new(0.0, 24.0), Feet::new(5.0)),
            DiskPlacement::Straddles
        );
    }

    #[test]
    fn test_classify_disk_covering_every_subplot() {
        let layout = PlotLayout::standard();
        // Reaching the far edge of subplots 2-4 needs a radius above 144 ft
        assert_eq!(
            layout.classify_disk(Vec2::zeros(), Feet::new(140.0)),
            DiskPlacement::Straddles
        );
        assert_eq!(
            layout.classify_disk(Vec2::zeros(), Feet::new(150.0)),
            DiskPlacement::Covers
        );
        assert_eq!(
            layout.classify_disk(Vec2::new(3.0, -4.0), Feet::new(5e11)),
            DiskPlacement::Covers
        );
        assert_eq!(
            layout.classify_disk(Vec2::zeros(), Feet::new(f64::MAX / 4.0)),
            DiskPlacement::Covers
        );
    }
}
