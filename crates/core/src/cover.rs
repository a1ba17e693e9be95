//! Crown footprint and cover engine
//!
//! Per plot:
//! 1. Build each crown disk at its placed position
//! 2. Clip it to the sampled-area boundary
//! 3. Sum the clipped areas (`total_crown_area`, overlaps counted twice)
//! 4. Dissolve the clipped footprints (`area_covered`, overlaps counted once)
//! 5. Relate both to the sampled area
//!
//! Most crowns sit well inside one subplot or well outside all of them; those
//! skip the boolean clip entirely, as do crowns wide enough to cover every
//! subplot (see [`PlotLayout::classify_disk`]).

use crate::config::CoverConfig;
use crate::core_types::{PlotKey, SquareFeet, Tree};
use crate::error::{ConfigError, CoverError, TreeDiagnostic};
use crate::geometry::{DiskBuilder, Region};
use crate::layout::{DiskPlacement, PlotLayout};
use crate::placement::{place_trees, PlacedTree};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverStats {
    /// Plot key
    pub plot: PlotKey,
    /// Sum of clipped crown areas, overlaps counted twice
    pub total_crown_area: SquareFeet,
    /// Area of the dissolved canopy, overlaps counted once
    pub area_covered: SquareFeet,
    /// Share of `total_crown_area` that is double-counted overlap
    ///
    /// `None` when the plot has no crown area at all.
    pub overlap_prop: Option<f64>,
    /// `area_covered / sampled_area`, the overlap-corrected cover
    pub crown_cover_prop_no_overlap: f64,
    /// `total_crown_area / sampled_area`, may exceed 1
    pub crown_cover_prop_with_overlap: f64,
}

impl CoverStats {
    /// Derive the cover fractions from accumulated areas
    ///
    /// Floating-point noise from the polygon engine is clamped so that
    /// `area_covered <= total_crown_area` and `area_covered <= sampled_area`
    /// hold exactly.
    ///
    /// # Errors
    /// Returns [`CoverError::NonFiniteArea`] if any input area is NaN or
    /// infinite, or if the sampled area is not positive.
    pub fn from_areas(
        plot: PlotKey,
        total_crown_area: SquareFeet,
        area_covered: SquareFeet,
        sampled_area: SquareFeet,
    ) -> Result<Self, CoverError> {
        check_finite("total_crown_area", total_crown_area)?;
        check_finite("area_covered", area_covered)?;
        check_finite("sampled_area", sampled_area)?;
        if sampled_area.value() <= 0.0 {
            return Err(CoverError::NonFiniteArea {
                quantity: "sampled_area",
                value: sampled_area.value(),
            });
        }

        let total = total_crown_area.value().max(0.0);
        let covered = area_covered
            .value()
            .max(0.0)
            .min(total)
            .min(sampled_area.value());

        let overlap_prop = SquareFeet::from(total - covered)
            .ratio_to(SquareFeet::from(total))
            .map(|p| p.clamp(0.0, 1.0));

        Ok(Self {
            plot,
            total_crown_area: SquareFeet::from(total),
            area_covered: SquareFeet::from(covered),
            overlap_prop,
            crown_cover_prop_no_overlap: (covered / sampled_area.value()).clamp(0.0, 1.0),
            crown_cover_prop_with_overlap: total / sampled_area.value(),
        })
    }

    /// True when at least one crown reached the sampled area
    pub fn has_canopy(&self) -> bool {
        self.total_crown_area.value() > 0.0
    }
}

fn check_finite(quantity: &'static str, area: SquareFeet) -> Result<(), CoverError> {
    if area.value().is_finite() {
        Ok(())
    } else {
        Err(CoverError::NonFiniteArea {
            quantity,
            value: area.value(),
        })
    }
}

/// A crown disk clipped to the sampled area
#[derive(Debug, Clone)]
pub struct CrownFootprint {
    /// Tree identifier
    pub tree_id: u64,
    /// How the disk related to the boundary before clipping
    pub placement: DiskPlacement,
    /// Clipped footprint, empty for crowns outside the plot
    pub region: Region,
    /// Area of `region`
    pub area: SquareFeet,
}

/// Cover statistics plus the geometry that produced them
#[derive(Debug, Clone)]
pub struct CoverDetail {
    /// The table row
    pub stats: CoverStats,
    /// One clipped footprint per input tree, in input order
    pub footprints: Vec<CrownFootprint>,
    /// Dissolved canopy
    pub canopy: Region,
}

/// Result of running one plot from raw trees
#[derive(Debug, Clone)]
pub struct PlotOutcome {
    /// Plot key
    pub plot: PlotKey,
    /// Cover statistics, or why the plot was dropped
    pub stats: Result<CoverStats, CoverError>,
    /// Trees that failed placement
    pub rejected: Vec<TreeDiagnostic>,
    /// Trees that reached the engine
    pub trees_used: usize,
}

/// Per-plot cover computation
///
/// Holds only the immutable layout and tolerance, so one engine can be
/// shared by every worker in a batch.
#[derive(Debug, Clone)]
pub struct CoverEngine {
    layout: PlotLayout,
    sliver_tolerance: SquareFeet,
}

impl CoverEngine {
    /// Build an engine from a config
    ///
    /// # Errors
    /// Returns the config's validation error, if any.
    pub fn new(config: &CoverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let disks = DiskBuilder::new(config.disk_resolution.segments());
        Ok(Self::with_layout(
            PlotLayout::new(&disks),
            config.sliver_tolerance,
        ))
    }

    /// Build an engine around an existing layout
    pub fn with_layout(layout: PlotLayout, sliver_tolerance: SquareFeet) -> Self {
        Self {
            layout,
            sliver_tolerance,
        }
    }

    /// Plot layout used for placement and clipping
    pub fn layout(&self) -> &PlotLayout {
        &self.layout
    }

    /// Clipped footprint of one placed tree
    pub fn footprint(&self, tree: &PlacedTree) -> CrownFootprint {
        let radius = tree.crown_radius();
        let placement = self.layout.classify_disk(tree.position, radius);
        let region = match placement {
            DiskPlacement::Outside => Region::empty(),
            DiskPlacement::Covers => self.layout.boundary().clone(),
            DiskPlacement::Inside(_) => {
                Region::from_polygon(self.layout.disks().disk(tree.position, radius))
            }
            DiskPlacement::Straddles => {
                let crown = Region::from_polygon(self.layout.disks().disk(tree.position, radius));
                crown.intersection(self.layout.boundary(), self.sliver_tolerance)
            }
        };
        let area = region.area();
        CrownFootprint {
            tree_id: tree.id,
            placement,
            region,
            area,
        }
    }

    /// Cover statistics for already placed trees
    ///
    /// # Errors
    /// Returns [`CoverError::NonFiniteArea`] if the polygon engine produced
    /// a NaN or infinite area.
    pub fn compute_placed(
        &self,
        plot: &PlotKey,
        trees: &[PlacedTree],
    ) -> Result<CoverStats, CoverError> {
        self.compute_detailed(plot, trees).map(|d| d.stats)
    }

    /// Cover statistics plus clipped footprints and the dissolved canopy
    ///
    /// # Errors
    /// See [`CoverEngine::compute_placed`].
    pub fn compute_detailed(
        &self,
        plot: &PlotKey,
        trees: &[PlacedTree],
    ) -> Result<CoverDetail, CoverError> {
        let footprints: Vec<CrownFootprint> = trees.iter().map(|t| self.footprint(t)).collect();

        let total_crown_area: SquareFeet = footprints.iter().map(|f| f.area).sum();
        let regions: Vec<Region> = footprints.iter().map(|f| f.region.clone()).collect();
        let canopy = Region::dissolve(&regions, self.sliver_tolerance);
        let area_covered = canopy.area();

        let stats = CoverStats::from_areas(
            plot.clone(),
            total_crown_area,
            area_covered,
            self.layout.sampled_area(),
        )?;

        debug!(
            plot = %plot,
            trees = trees.len(),
            total_crown_area = stats.total_crown_area.value(),
            area_covered = stats.area_covered.value(),
            cover = stats.crown_cover_prop_no_overlap,
            "Computed plot cover"
        );

        Ok(CoverDetail {
            stats,
            footprints,
            canopy,
        })
    }

    /// Place and compute one plot from its prepared trees
    ///
    /// Trees failing placement are dropped and reported; the plot still
    /// computes from the rest.
    pub fn compute(&self, plot: &PlotKey, trees: &[Tree]) -> PlotOutcome {
        let (placed, rejected) = place_trees(&self.layout, plot, trees);
        PlotOutcome {
            plot: plot.clone(),
            stats: self.compute_placed(plot, &placed),
            rejected,
            trees_used: placed.len(),
        }
    }
}

impl Default for CoverEngine {
    fn default() -> Self {
        let config = CoverConfig::default();
        Self::with_layout(PlotLayout::standard(), config.sliver_tolerance)
    }
}
