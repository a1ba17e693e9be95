//! Integration tests for the cover engine on whole plots
//!
//! Trees go through placement exactly as they do in a batch, so these cover
//! layout, placement, clipping and dissolve together.

use approx::assert_relative_eq;
use canopy_cover_core::layout::nominal_sampled_area;
use canopy_cover_core::{
    CoverConfig, CoverEngine, Degrees, DiskResolution, Feet, Inches, PlotKey, SpeciesCode, Tree,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

fn tree(id: u64, subplot: u8, distance: f64, azimuth: f64, crown_width: f64) -> Tree {
    Tree {
        id,
        subplot,
        distance: Feet::new(distance),
        azimuth: Degrees::new(azimuth),
        species: SpeciesCode(202),
        diameter: Inches::new(14.0),
        crown_width: Feet::new(crown_width),
        tpa: 6.018,
    }
}

fn engine() -> CoverEngine {
    CoverEngine::new(&CoverConfig::default()).unwrap()
}

fn plot() -> PlotKey {
    PlotKey::from("40001234010690")
}

#[test]
fn test_single_centered_tree_scenario() {
    let engine = engine();
    assert_relative_eq!(
        engine.layout().sampled_area().value(),
        7238.23,
        epsilon = 1e-2
    );

    let stats = engine
        .compute(&plot(), &[tree(1, 1, 0.0, 0.0, 20.0)])
        .stats
        .unwrap();
    assert_relative_eq!(stats.area_covered.value(), 314.16, epsilon = 1e-2);
    assert_relative_eq!(stats.total_crown_area.value(), 314.16, epsilon = 1e-2);
    assert_relative_eq!(stats.crown_cover_prop_no_overlap, 0.0434, epsilon = 1e-4);
}

#[test]
fn test_two_trees_five_feet_apart() {
    let stats = engine()
        .compute(
            &plot(),
            &[tree(1, 2, 0.0, 0.0, 20.0), tree(2, 2, 5.0, 90.0, 20.0)],
        )
        .stats
        .unwrap();
    let one = PI * 100.0;
    assert!(stats.area_covered.value() > one);
    assert!(stats.area_covered.value() < 2.0 * one);
    let overlap = stats.overlap_prop.unwrap();
    assert!(overlap > 0.0 && overlap < 0.5, "overlap_prop = {overlap}");
}

#[test]
fn test_coincident_trees_on_outer_subplot() {
    let stats = engine()
        .compute(
            &plot(),
            &[tree(1, 4, 8.0, 30.0, 14.0), tree(2, 4, 8.0, 30.0, 14.0)],
        )
        .stats
        .unwrap();
    assert_relative_eq!(
        stats.total_crown_area.value(),
        2.0 * stats.area_covered.value(),
        max_relative = 1e-6
    );
    assert_relative_eq!(stats.overlap_prop.unwrap(), 0.5, epsilon = 1e-6);
}

#[test]
fn test_crown_clipped_at_subplot_edge() {
    // Stem on the subplot 3 boundary: about half of the crown is sampled
    let stats = engine()
        .compute(&plot(), &[tree(1, 3, 24.0, 300.0, 10.0)])
        .stats
        .unwrap();
    let full = PI * 25.0;
    assert!(stats.total_crown_area.value() < 0.6 * full);
    assert!(stats.total_crown_area.value() > 0.4 * full);
    assert_relative_eq!(
        stats.area_covered.value(),
        stats.total_crown_area.value(),
        max_relative = 1e-9
    );
}

#[test]
fn test_tree_outside_every_subplot_contributes_nothing() {
    // Tallied on subplot 1 but recorded 70 ft out, between subplots
    let stats = engine()
        .compute(&plot(), &[tree(1, 1, 70.0, 60.0, 20.0)])
        .stats
        .unwrap();
    assert_eq!(stats.area_covered.value(), 0.0);
    assert_eq!(stats.total_crown_area.value(), 0.0);
    assert!(stats.overlap_prop.is_none());
}

#[test]
fn test_crown_wider_than_the_plot() {
    let engine = engine();
    for crown_width in [1e6, 1e12, 1e300] {
        let stats = engine
            .compute(&plot(), &[tree(1, 1, 0.0, 0.0, crown_width)])
            .stats
            .unwrap();
        assert_eq!(stats.crown_cover_prop_no_overlap, 1.0);
        assert_eq!(
            stats.total_crown_area.value(),
            engine.layout().sampled_area().value()
        );
    }
}

#[test]
fn test_zero_tree_plot() {
    let outcome = engine().compute(&plot(), &[]);
    let stats = outcome.stats.unwrap();
    assert_eq!(stats.area_covered.value(), 0.0);
    assert_eq!(stats.crown_cover_prop_no_overlap, 0.0);
    assert_eq!(outcome.trees_used, 0);
}

fn random_trees(rng: &mut StdRng, n: u64) -> Vec<Tree> {
    (0..n)
        .map(|id| {
            tree(
                id,
                rng.random_range(1..=4),
                rng.random_range(0.0..30.0),
                rng.random_range(0.0..360.0),
                rng.random_range(2.0..35.0),
            )
        })
        .collect()
}

#[test]
fn test_adding_trees_never_decreases_cover() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..5 {
        let trees = random_trees(&mut rng, 25);
        let mut prev_covered = 0.0;
        let mut prev_total = 0.0;
        for k in 1..=trees.len() {
            let stats = engine.compute(&plot(), &trees[..k]).stats.unwrap();
            // Overlay snapping moves areas by a few parts per billion
            assert!(stats.area_covered.value() >= prev_covered * (1.0 - 1e-8));
            assert!(stats.total_crown_area.value() >= prev_total * (1.0 - 1e-8));
            prev_covered = stats.area_covered.value();
            prev_total = stats.total_crown_area.value();
        }
    }
}

#[test]
fn test_cover_bounds_under_heavy_overlap() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(7);
    let trees = random_trees(&mut rng, 120);
    let stats = engine.compute(&plot(), &trees).stats.unwrap();

    assert!(stats.crown_cover_prop_no_overlap >= 0.0);
    assert!(stats.crown_cover_prop_no_overlap <= 1.0);
    assert!(stats.crown_cover_prop_no_overlap <= stats.crown_cover_prop_with_overlap);
    assert!(stats.crown_cover_prop_with_overlap > 1.0);
    assert!(stats.area_covered.value() <= engine.layout().sampled_area().value());
}

#[test]
fn test_resolution_does_not_bias_unclipped_area() {
    for resolution in [
        DiskResolution::Coarse,
        DiskResolution::Standard,
        DiskResolution::Fine,
    ] {
        let config = CoverConfig {
            disk_resolution: resolution,
            ..Default::default()
        };
        let engine = CoverEngine::new(&config).unwrap();
        assert_relative_eq!(
            engine.layout().sampled_area().value(),
            nominal_sampled_area().value(),
            max_relative = 1e-6
        );
        let stats = engine
            .compute(&plot(), &[tree(1, 1, 3.0, 45.0, 16.0)])
            .stats
            .unwrap();
        assert_relative_eq!(stats.area_covered.value(), PI * 64.0, max_relative = 1e-9);
    }
}
