//! Results table handed to the modelling stage

use crate::core_types::PlotKey;
use crate::cover::CoverStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One [`CoverStats`] row per plot, ordered by plot key
///
/// Serializes as an array of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<CoverStats>", from = "Vec<CoverStats>")]
pub struct CoverTable {
    rows: BTreeMap<PlotKey, CoverStats>,
}

impl CoverTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the row for `stats.plot`
    pub fn insert(&mut self, stats: CoverStats) -> Option<CoverStats> {
        self.rows.insert(stats.plot.clone(), stats)
    }

    /// Row for `plot`
    pub fn get(&self, plot: &PlotKey) -> Option<&CoverStats> {
        self.rows.get(plot)
    }

    /// All rows in plot key order
    pub fn rows(&self) -> impl Iterator<Item = &CoverStats> {
        self.rows.values()
    }

    /// Rows usable for modelling: those with a defined overlap proportion
    pub fn modelling_rows(&self) -> impl Iterator<Item = &CoverStats> {
        self.rows.values().filter(|r| r.overlap_prop.is_some())
    }

    /// Mean overlap-corrected cover across all rows, `None` when empty
    pub fn mean_cover(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let n = self.rows.len() as f64;
        Some(
            self.rows
                .values()
                .map(|r| r.crown_cover_prop_no_overlap)
                .sum::<f64>()
                / n,
        )
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<CoverStats> for CoverTable {
    fn from_iter<I: IntoIterator<Item = CoverStats>>(iter: I) -> Self {
        let mut table = Self::new();
        for stats in iter {
            table.insert(stats);
        }
        table
    }
}

impl From<Vec<CoverStats>> for CoverTable {
    fn from(rows: Vec<CoverStats>) -> Self {
        rows.into_iter().collect()
    }
}

impl From<CoverTable> for Vec<CoverStats> {
    fn from(table: CoverTable) -> Self {
        table.rows.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a CoverTable {
    type Item = &'a CoverStats;
    type IntoIter = std::collections::btree_map::Values<'a, PlotKey, CoverStats>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}
