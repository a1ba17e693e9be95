//! Batch orchestration
//!
//! Runs the cover engine once per plot on a rayon pool. Plots share nothing
//! but the immutable engine, so each worker owns its geometry buffers and
//! results are joined into the table only after the parallel section.
//!
//! A failing plot (non-finite area, or a panic inside the polygon engine)
//! is logged and left out of the table; it never aborts the batch.
//! Cancellation is checked before each plot starts.

use crate::config::CoverConfig;
use crate::core_types::{PlotKey, Tree};
use crate::cover::{CoverEngine, PlotOutcome};
use crate::density::StandDensity;
use crate::error::{ConfigError, CoverError, PlotDiagnostic, TreeDiagnostic};
use crate::placement::place_trees;
use crate::table::CoverTable;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared flag for interrupting a running batch between plots
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the batch to stop; plots already running finish
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Counts surfaced to the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Plots submitted
    pub plots_total: usize,
    /// Plots with a table row
    pub plots_computed: usize,
    /// Plots dropped because the engine failed
    pub plots_failed: usize,
    /// Plots skipped after cancellation
    pub plots_cancelled: usize,
    /// Trees that reached the engine
    pub trees_used: usize,
    /// Trees dropped at placement
    pub trees_rejected: usize,
}

/// Everything a batch produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// One row per computed plot
    pub table: CoverTable,
    /// Stand density for each computed plot
    pub density: BTreeMap<PlotKey, StandDensity>,
    /// Trees dropped at placement
    pub tree_diagnostics: Vec<TreeDiagnostic>,
    /// Plots left out of the table
    pub plot_diagnostics: Vec<PlotDiagnostic>,
    /// Counts
    pub summary: BatchSummary,
}

/// Runs the cover engine across many plots
pub struct BatchProcessor {
    engine: CoverEngine,
    pool: Option<rayon::ThreadPool>,
    cancel: CancelToken,
}

impl BatchProcessor {
    /// Build a processor from a config
    ///
    /// With `config.threads` set, plots run on a dedicated pool of that
    /// size; otherwise on rayon's global pool.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the config is invalid or the pool cannot
    /// be created.
    pub fn new(config: &CoverConfig) -> Result<Self, ConfigError> {
        let engine = CoverEngine::new(config)?;
        let pool = config
            .threads
            .map(|n| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("cover-worker-{i}"))
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))
            })
            .transpose()?;
        Ok(Self {
            engine,
            pool,
            cancel: CancelToken::new(),
        })
    }

    /// Wrap an existing engine, running on the global pool
    pub fn with_engine(engine: CoverEngine) -> Self {
        Self {
            engine,
            pool: None,
            cancel: CancelToken::new(),
        }
    }

    /// The engine applied to each plot
    pub fn engine(&self) -> &CoverEngine {
        &self.engine
    }

    /// A handle that cancels the batch currently running on this processor
    ///
    /// A cancel stops the batch in flight, or the next one if none is
    /// running. The flag clears when that batch returns, so later batches
    /// on the same processor run normally.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Compute cover for every plot
    pub fn run(&self, plots: &BTreeMap<PlotKey, Vec<Tree>>) -> BatchReport {
        self.run_with(plots, CoverEngine::compute)
    }

    /// Compute every plot with a custom per-plot function
    ///
    /// `per_plot` receives the shared engine; panics inside it are caught
    /// and reported as [`CoverError::EnginePanic`].
    pub fn run_with<F>(&self, plots: &BTreeMap<PlotKey, Vec<Tree>>, per_plot: F) -> BatchReport
    where
        F: Fn(&CoverEngine, &PlotKey, &[Tree]) -> PlotOutcome + Sync,
    {
        let work = || -> Vec<(PlotOutcome, Option<StandDensity>)> {
            plots
                .par_iter()
                .map(|(plot, trees)| self.run_plot(plot, trees, &per_plot))
                .collect()
        };
        let outcomes = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        self.cancel.reset();

        let report = collect_report(outcomes);
        let s = &report.summary;
        info!(
            plots = s.plots_total,
            computed = s.plots_computed,
            failed = s.plots_failed,
            cancelled = s.plots_cancelled,
            trees_used = s.trees_used,
            trees_rejected = s.trees_rejected,
            "Batch complete"
        );
        report
    }

    fn run_plot<F>(
        &self,
        plot: &PlotKey,
        trees: &[Tree],
        per_plot: &F,
    ) -> (PlotOutcome, Option<StandDensity>)
    where
        F: Fn(&CoverEngine, &PlotKey, &[Tree]) -> PlotOutcome + Sync,
    {
        if self.cancel.is_cancelled() {
            return (failed_outcome(plot, CoverError::Cancelled, Vec::new()), None);
        }

        match catch_unwind(AssertUnwindSafe(|| per_plot(&self.engine, plot, trees))) {
            Ok(outcome) => {
                let density = outcome
                    .stats
                    .is_ok()
                    .then(|| StandDensity::from_trees(plot.clone(), trees));
                (outcome, density)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_owned());
                // Placement is plain validation, so its rejections survive a
                // panic further down
                let (_, rejected) = place_trees(self.engine.layout(), plot, trees);
                (
                    failed_outcome(plot, CoverError::EnginePanic(message), rejected),
                    None,
                )
            }
        }
    }
}

fn failed_outcome(
    plot: &PlotKey,
    error: CoverError,
    rejected: Vec<TreeDiagnostic>,
) -> PlotOutcome {
    PlotOutcome {
        plot: plot.clone(),
        stats: Err(error),
        rejected,
        trees_used: 0,
    }
}

fn collect_report(outcomes: Vec<(PlotOutcome, Option<StandDensity>)>) -> BatchReport {
    let mut report = BatchReport::default();
    report.summary.plots_total = outcomes.len();

    for (outcome, density) in outcomes {
        report.summary.trees_rejected += outcome.rejected.len();
        report.tree_diagnostics.extend(outcome.rejected);

        match outcome.stats {
            Ok(stats) => {
                report.summary.plots_computed += 1;
                report.summary.trees_used += outcome.trees_used;
                if let Some(d) = density {
                    report.density.insert(outcome.plot.clone(), d);
                }
                report.table.insert(stats);
            }
            Err(CoverError::Cancelled) => {
                report.summary.plots_cancelled += 1;
                report.plot_diagnostics.push(PlotDiagnostic {
                    plot: outcome.plot,
                    error: CoverError::Cancelled,
                });
            }
            Err(error) => {
                warn!(plot = %outcome.plot, %error, "Excluding plot");
                report.summary.plots_failed += 1;
                report.plot_diagnostics.push(PlotDiagnostic {
                    plot: outcome.plot,
                    error,
                });
            }
        }
    }

    if report.summary.plots_cancelled > 0 {
        warn!(
            skipped = report.summary.plots_cancelled,
            "Batch cancelled before all plots ran"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Degrees, Feet, Inches, SpeciesCode};

    fn tree(id: u64, subplot: u8) -> Tree {
        Tree {
            id,
            subplot,
            distance: Feet::new(6.0),
            azimuth: Degrees::new(200.0),
            species: SpeciesCode(93),
            diameter: Inches::new(9.0),
            crown_width: Feet::new(12.0),
            tpa: 6.018,
        }
    }

    fn plots(n: usize) -> BTreeMap<PlotKey, Vec<Tree>> {
        (0..n)
            .map(|i| (PlotKey::new(format!("p{i}")), vec![tree(1, 1), tree(2, 3)]))
            .collect()
    }

    #[test]
    fn test_run_computes_every_plot() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let processor = BatchProcessor::new(&CoverConfig::default()).unwrap();
        let report = processor.run(&plots(8));
        assert_eq!(report.summary.plots_total, 8);
        assert_eq!(report.summary.plots_computed, 8);
        assert_eq!(report.table.len(), 8);
        assert_eq!(report.density.len(), 8);
        assert_eq!(report.summary.trees_used, 16);
    }

    #[test]
    fn test_dedicated_pool() {
        let config = CoverConfig {
            threads: Some(2),
            ..Default::default()
        };
        let processor = BatchProcessor::new(&config).unwrap();
        assert_eq!(processor.run(&plots(5)).table.len(), 5);
    }

    #[test]
    fn test_panicking_plot_is_isolated() {
        let processor = BatchProcessor::new(&CoverConfig::default()).unwrap();
        let mut input = plots(4);
        if let Some(trees) = input.get_mut(&PlotKey::from("p2")) {
            trees.push(tree(9, 0));
        }
        let report = processor.run_with(&input, |engine, plot, trees| {
            assert!(plot.as_str() != "p2", "degenerate ring");
            engine.compute(plot, trees)
        });
        assert_eq!(report.summary.plots_computed, 3);
        assert_eq!(report.summary.plots_failed, 1);
        // Placement rejections of the failed plot are still reported
        assert_eq!(report.summary.trees_rejected, 1);
        assert_eq!(report.tree_diagnostics[0].tree_id, 9);
        assert!(report.table.get(&PlotKey::from("p2")).is_none());
        assert!(matches!(
            &report.plot_diagnostics[0].error,
            CoverError::EnginePanic(msg) if msg.contains("degenerate ring")
        ));
    }

    #[test]
    fn test_cancelled_batch_skips_plots() {
        let processor = BatchProcessor::new(&CoverConfig::default()).unwrap();
        processor.cancel_token().cancel();
        let report = processor.run(&plots(3));
        assert_eq!(report.summary.plots_cancelled, 3);
        assert!(report.table.is_empty());
    }

    #[test]
    fn test_cancel_does_not_outlive_its_batch() {
        let processor = BatchProcessor::new(&CoverConfig::default()).unwrap();
        let token = processor.cancel_token();
        token.cancel();
        assert_eq!(processor.run(&plots(2)).summary.plots_cancelled, 2);
        assert!(!token.is_cancelled());

        let report = processor.run(&plots(2));
        assert_eq!(report.summary.plots_cancelled, 0);
        assert_eq!(report.summary.plots_computed, 2);
    }

    #[test]
    fn test_rejected_trees_are_counted() {
        let mut input = plots(1);
        input
            .values_mut()
            .for_each(|trees| trees.push(tree(3, 0)));
        let processor = BatchProcessor::new(&CoverConfig::default()).unwrap();
        let report = processor.run(&input);
        assert_eq!(report.summary.trees_rejected, 1);
        assert_eq!(report.tree_diagnostics[0].tree_id, 3);
        assert_eq!(report.summary.plots_computed, 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CoverConfig {
            threads: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            BatchProcessor::new(&config),
            Err(ConfigError::ZeroThreads)
        ));
    }
}
