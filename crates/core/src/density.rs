//! Stand density summaries
//!
//! Per-acre attributes expanded with each tree's `tpa` factor. These feed
//! the modelling stage next to the cover table.

use crate::core_types::{PlotKey, Tree};
use serde::{Deserialize, Serialize};

/// Basal area of one stem in square feet per square inch of DBH², `π/(4·144)`
pub const BASAL_AREA_FACTOR: f64 = 0.005_454_154;

/// Live-tree density of one plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandDensity {
    /// Plot key
    pub plot: PlotKey,
    /// Trees tallied
    pub tree_count: usize,
    /// Σ TPA
    pub trees_per_acre: f64,
    /// Σ `BASAL_AREA_FACTOR`·DBH²·TPA (ft²/acre)
    pub basal_area_per_acre: f64,
    /// Diameter of the tree of mean basal area (inches), `None` without trees
    pub quadratic_mean_diameter: Option<f64>,
}

impl StandDensity {
    /// Summarize one plot's trees
    ///
    /// Trees with a non-finite or negative expansion factor are skipped.
    pub fn from_trees(plot: PlotKey, trees: &[Tree]) -> Self {
        let mut tree_count = 0;
        let mut tpa_sum = 0.0;
        let mut basal_area = 0.0;
        let mut weighted_d2 = 0.0;

        for tree in trees {
            if !tree.tpa.is_finite() || tree.tpa < 0.0 {
                continue;
            }
            let d = tree.diameter.value();
            tree_count += 1;
            tpa_sum += tree.tpa;
            basal_area += BASAL_AREA_FACTOR * d * d * tree.tpa;
            weighted_d2 += d * d * tree.tpa;
        }

        let quadratic_mean_diameter = (tpa_sum > 0.0).then(|| (weighted_d2 / tpa_sum).sqrt());

        Self {
            plot,
            tree_count,
            trees_per_acre: tpa_sum,
            basal_area_per_acre: basal_area,
            quadratic_mean_diameter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Degrees, Feet, Inches, SpeciesCode};
    use approx::assert_relative_eq;

    fn tree(diameter: f64, tpa: f64) -> Tree {
        Tree {
            id: 1,
            subplot: 1,
            distance: Feet::ZERO,
            azimuth: Degrees::NORTH,
            species: SpeciesCode(202),
            diameter: Inches::new(diameter),
            crown_width: Feet::new(10.0),
            tpa,
        }
    }

    #[test]
    fn test_single_tree_density() {
        let d = StandDensity::from_trees(PlotKey::from("p"), &[tree(10.0, 6.018)]);
        assert_eq!(d.tree_count, 1);
        assert_relative_eq!(d.trees_per_acre, 6.018);
        assert_relative_eq!(
            d.basal_area_per_acre,
            BASAL_AREA_FACTOR * 100.0 * 6.018,
            max_relative = 1e-12
        );
        assert_relative_eq!(d.quadratic_mean_diameter.unwrap(), 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_qmd_weights_large_trees() {
        let d = StandDensity::from_trees(
            PlotKey::from("p"),
            &[tree(6.0, 6.018), tree(18.0, 6.018)],
        );
        let qmd = d.quadratic_mean_diameter.unwrap();
        // sqrt((36 + 324) / 2)
        assert_relative_eq!(qmd, 180.0_f64.sqrt(), max_relative = 1e-12);
        assert!(qmd > 12.0);
    }

    #[test]
    fn test_empty_plot() {
        let d = StandDensity::from_trees(PlotKey::from("p"), &[]);
        assert_eq!(d.tree_count, 0);
        assert_eq!(d.basal_area_per_acre, 0.0);
        assert!(d.quadratic_mean_diameter.is_none());
    }

    #[test]
    fn test_bad_expansion_factor_skipped() {
        let d = StandDensity::from_trees(
            PlotKey::from("p"),
            &[tree(10.0, f64::NAN), tree(10.0, 2.0)],
        );
        assert_eq!(d.tree_count, 1);
        assert_relative_eq!(d.trees_per_acre, 2.0);
    }
}
