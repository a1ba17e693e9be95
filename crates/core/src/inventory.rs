//! Inventory preparation
//!
//! Raw plot and tree records come from an external inventory provider.
//! This module filters them down to what the cover engine accepts:
//!
//! 1. Keep active plots in the requested inventory years
//! 2. Keep live trees at or above the minimum diameter
//! 3. Fill crown widths from a [`CrownWidthModel`], then impute the gaps
//!    with diameter-class means
//! 4. Drop trees still lacking a positive crown width
//! 5. Partition by plot key
//!
//! Every dropped tree is reported with a [`TreeRejection`].

use crate::config::CoverConfig;
use crate::core_types::{Degrees, Feet, Inches, PlotKey, SpeciesCode, Tree, TreeStatus};
use crate::error::{TreeDiagnostic, TreeRejection};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// Plot sampling status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotStatus {
    /// Sampled, at least one accessible forest condition
    #[default]
    Active,
    /// Not sampled or not forested
    Inactive,
}

/// One plot visit as delivered by the inventory provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRecord {
    /// Plot key
    pub key: PlotKey,
    /// Sampling status
    #[serde(default)]
    pub status: PlotStatus,
    /// Inventory year
    pub inventory_year: u16,
    /// Latitude (decimal degrees), unused by the geometry
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude (decimal degrees), unused by the geometry
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Keys of active plots measured within `years`
pub fn select_active_plots(
    plots: &[PlotRecord],
    years: &RangeInclusive<u16>,
) -> BTreeSet<PlotKey> {
    plots
        .iter()
        .filter(|p| p.status == PlotStatus::Active && years.contains(&p.inventory_year))
        .map(|p| p.key.clone())
        .collect()
}

/// One tree as delivered by the inventory provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Plot the tree was tallied on
    pub plot: PlotKey,
    /// Tree identifier, unique within its plot
    pub id: u64,
    /// Subplot number
    pub subplot: u8,
    /// Inventory status code (1 = live)
    pub status_code: u8,
    /// Diameter at breast height
    pub diameter: Inches,
    /// Total height, carried for downstream use
    #[serde(default)]
    pub height: Option<Feet>,
    /// Species code
    pub species: SpeciesCode,
    /// Distance from subplot center
    pub distance: Feet,
    /// Bearing from subplot center
    pub azimuth: Degrees,
    /// Trees-per-acre expansion factor
    pub tpa: f64,
    /// Crown width, if already known
    #[serde(default)]
    pub crown_width: Option<Feet>,
}

impl TreeRecord {
    /// Decoded status
    pub fn status(&self) -> TreeStatus {
        TreeStatus::from_code(self.status_code)
    }

    fn has_valid_crown_width(&self) -> bool {
        self.crown_width.is_some_and(Feet::is_positive_finite)
    }
}

/// Predicts crown width from species and diameter
///
/// Implementations may return `None` for species or sizes they do not
/// cover; those trees go on to imputation.
pub trait CrownWidthModel: Send + Sync {
    /// Predicted crown width
    fn predict(&self, species: SpeciesCode, diameter: Inches) -> Option<Feet>;
}

/// Adapts a closure into a [`CrownWidthModel`]
pub struct FnCrownWidthModel<F>(pub F);

impl<F> CrownWidthModel for FnCrownWidthModel<F>
where
    F: Fn(SpeciesCode, Inches) -> Option<Feet> + Send + Sync,
{
    fn predict(&self, species: SpeciesCode, diameter: Inches) -> Option<Feet> {
        (self.0)(species, diameter)
    }
}

/// Fill missing crown widths from `model`
///
/// Predictions that are not positive and finite are discarded. Returns the
/// number of trees that received a prediction.
pub fn predict_crown_widths(records: &mut [TreeRecord], model: &dyn CrownWidthModel) -> usize {
    let mut predicted = 0;
    for record in records.iter_mut().filter(|r| !r.has_valid_crown_width()) {
        let width = model
            .predict(record.species, record.diameter)
            .filter(|w| w.is_positive_finite());
        if width.is_some() {
            predicted += 1;
        }
        record.crown_width = width;
    }
    predicted
}

fn diameter_class(diameter: Inches, class_width: Inches) -> Option<i64> {
    let d = diameter.value();
    let w = class_width.value();
    if !d.is_finite() || d <= 0.0 || !w.is_finite() || w <= 0.0 {
        return None;
    }
    Some((d / w).floor() as i64)
}

/// Impute missing crown widths with the mean of the tree's diameter class
///
/// Classes are `class_width` inches wide. The first pass averages valid
/// crown widths per class; the second fills trees lacking one. Trees whose
/// class has no valid width keep `None`. Returns the number imputed.
pub fn impute_crown_widths(records: &mut [TreeRecord], class_width: Inches) -> usize {
    let mut sums: FxHashMap<i64, (f64, u32)> = FxHashMap::default();
    for record in records.iter().filter(|r| r.has_valid_crown_width()) {
        if let (Some(class), Some(width)) =
            (diameter_class(record.diameter, class_width), record.crown_width)
        {
            let entry = sums.entry(class).or_insert((0.0, 0));
            entry.0 += width.value();
            entry.1 += 1;
        }
    }

    let mut imputed = 0;
    for record in records.iter_mut().filter(|r| !r.has_valid_crown_width()) {
        let mean = diameter_class(record.diameter, class_width)
            .and_then(|class| sums.get(&class))
            .map(|&(sum, n)| Feet::from(sum / f64::from(n)));
        if mean.is_some() {
            imputed += 1;
        }
        record.crown_width = mean;
    }

    debug!(
        classes = sums.len(),
        imputed, "Imputed crown widths by diameter class"
    );
    imputed
}

/// Trees ready for the cover engine, plus everything that was dropped
#[derive(Debug, Clone, Default)]
pub struct PreparedInventory {
    /// Accepted trees by plot
    pub plots: BTreeMap<PlotKey, Vec<Tree>>,
    /// Dropped trees
    pub rejected: Vec<TreeDiagnostic>,
    /// Trees whose crown width came from a model prediction
    pub predicted: usize,
    /// Trees whose crown width came from class-mean imputation
    pub imputed: usize,
}

impl PreparedInventory {
    /// Add an empty entry for each plot in `keys` that has no trees
    ///
    /// Plots with no qualifying trees still get a (zero cover) row.
    pub fn ensure_plots<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a PlotKey>,
    {
        for key in keys {
            self.plots.entry(key.clone()).or_default();
        }
    }

    /// Drop every plot not in `keys`
    pub fn retain_plots(&mut self, keys: &BTreeSet<PlotKey>) {
        self.plots.retain(|k, _| keys.contains(k));
        self.rejected.retain(|d| keys.contains(&d.plot));
    }

    /// Number of accepted trees
    pub fn tree_count(&self) -> usize {
        self.plots.values().map(Vec::len).sum()
    }
}

fn screen(record: &TreeRecord, min_diameter: Inches) -> Result<(), TreeRejection> {
    let status = record.status();
    if !status.is_live() {
        return Err(TreeRejection::NotLive(status));
    }
    let d = record.diameter.value();
    if !d.is_finite() || d <= 0.0 {
        return Err(TreeRejection::InvalidDiameter(d));
    }
    if d < min_diameter.value() {
        return Err(TreeRejection::BelowMinimumDiameter {
            diameter: d,
            minimum: min_diameter.value(),
        });
    }
    Ok(())
}

fn reject(rejected: &mut Vec<TreeDiagnostic>, record: &TreeRecord, reason: TreeRejection) {
    warn!(plot = %record.plot, tree = record.id, %reason, "Excluding tree");
    rejected.push(TreeDiagnostic {
        plot: record.plot.clone(),
        tree_id: record.id,
        reason,
    });
}

/// Filter, fill crown widths and group raw tree records
///
/// Status and diameter are screened first so that dead or small trees do
/// not influence the class means. `model`, when given, fills crown widths
/// before imputation. Geometry fields (subplot, distance, azimuth) are
/// checked later, at placement.
pub fn prepare_inventory(
    records: Vec<TreeRecord>,
    model: Option<&dyn CrownWidthModel>,
    config: &CoverConfig,
) -> PreparedInventory {
    let total = records.len();
    let mut rejected = Vec::new();

    let mut kept: Vec<TreeRecord> = Vec::with_capacity(records.len());
    for record in records {
        match screen(&record, config.min_diameter) {
            Ok(()) => kept.push(record),
            Err(reason) => reject(&mut rejected, &record, reason),
        }
    }

    let predicted = model.map_or(0, |m| predict_crown_widths(&mut kept, m));
    let imputed = impute_crown_widths(&mut kept, config.diameter_class_width);

    let mut trees = Vec::with_capacity(kept.len());
    for record in kept {
        match record.crown_width.filter(|w| w.is_positive_finite()) {
            Some(crown_width) => trees.push((
                record.plot,
                Tree {
                    id: record.id,
                    subplot: record.subplot,
                    distance: record.distance,
                    azimuth: record.azimuth,
                    species: record.species,
                    diameter: record.diameter,
                    crown_width,
                    tpa: record.tpa,
                },
            )),
            None => {
                let width = record.crown_width.map(Feet::value);
                reject(&mut rejected, &record, TreeRejection::InvalidCrownWidth(width));
            }
        }
    }

    let plots = group_by_plot(trees);

    info!(
        records = total,
        accepted = total - rejected.len(),
        rejected = rejected.len(),
        predicted,
        imputed,
        plots = plots.len(),
        "Prepared inventory"
    );

    PreparedInventory {
        plots,
        rejected,
        predicted,
        imputed,
    }
}

/// Partition trees by plot key, keeping input order within each plot
pub fn group_by_plot<I>(trees: I) -> BTreeMap<PlotKey, Vec<Tree>>
where
    I: IntoIterator<Item = (PlotKey, Tree)>,
{
    let mut plots: BTreeMap<PlotKey, Vec<Tree>> = BTreeMap::new();
    for (plot, tree) in trees {
        plots.entry(plot).or_default().push(tree);
    }
    plots
}
