//! Seeded plot selection
//!
//! Used for picking illustrative plots and for holding plots out of model
//! fitting. Keys are sorted before shuffling, so the result depends only on
//! the set of keys and the seed, never on input order.

use crate::core_types::PlotKey;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Plots split into a fitting set and a held-out set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSplit {
    /// Plots used for fitting, sorted
    pub train: Vec<PlotKey>,
    /// Held-out plots, sorted
    pub validation: Vec<PlotKey>,
}

fn shuffled<'a, I>(keys: I, seed: u64) -> Vec<PlotKey>
where
    I: IntoIterator<Item = &'a PlotKey>,
{
    let mut keys: Vec<PlotKey> = keys.into_iter().cloned().collect();
    keys.sort();
    keys.dedup();
    let mut rng = StdRng::seed_from_u64(seed);
    keys.shuffle(&mut rng);
    keys
}

/// Pick up to `n` distinct plots at random, returned sorted
pub fn select_plots<'a, I>(keys: I, n: usize, seed: u64) -> Vec<PlotKey>
where
    I: IntoIterator<Item = &'a PlotKey>,
{
    let mut picked = shuffled(keys, seed);
    picked.truncate(n);
    picked.sort();
    picked
}

/// Split plots so that `train_fraction` of them (rounded) go to `train`
///
/// The fraction is clamped to `[0, 1]`; NaN is treated as 0.
pub fn train_validation_split<'a, I>(keys: I, train_fraction: f64, seed: u64) -> PlotSplit
where
    I: IntoIterator<Item = &'a PlotKey>,
{
    let mut keys = shuffled(keys, seed);
    let fraction = if train_fraction.is_nan() {
        0.0
    } else {
        train_fraction.clamp(0.0, 1.0)
    };

    let n_train = ((keys.len() as f64) * fraction).round() as usize;

    let mut validation = keys.split_off(n_train.min(keys.len()));
    keys.sort();
    validation.sort();
    PlotSplit {
        train: keys,
        validation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<PlotKey> {
        (0..n).map(|i| PlotKey::new(format!("plot-{i:03}"))).collect()
    }

    #[test]
    fn test_select_is_deterministic() {
        let all = keys(50);
        let a = select_plots(&all, 5, 42);
        let b = select_plots(&all, 5, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_select_ignores_input_order() {
        let all = keys(30);
        let mut reversed = all.clone();
        reversed.reverse();
        assert_eq!(select_plots(&all, 4, 7), select_plots(&reversed, 4, 7));
    }

    #[test]
    fn test_select_more_than_available() {
        let all = keys(3);
        assert_eq!(select_plots(&all, 10, 1), all);
    }

    #[test]
    fn test_split_partitions_keys() {
        let all = keys(20);
        let split = train_validation_split(&all, 0.75, 99);
        assert_eq!(split.train.len(), 15);
        assert_eq!(split.validation.len(), 5);

        let mut joined: Vec<PlotKey> = split.train.iter().chain(&split.validation).cloned().collect();
        joined.sort();
        assert_eq!(joined, all);
    }

    #[test]
    fn test_split_fraction_clamped() {
        let all = keys(4);
        assert_eq!(train_validation_split(&all, 2.0, 0).train.len(), 4);
        assert_eq!(train_validation_split(&all, f64::NAN, 0).validation.len(), 4);
    }
}
