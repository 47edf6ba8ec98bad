use crate::core::io::cif::CifFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::site::AdsorptionSite;
use crate::core::models::slab::Slab;
use crate::core::models::structure::AtomicStructure;
use crate::core::oracle::EnergyOracle;
use crate::engine::cancel::CancellationToken;
use crate::engine::collision::CollisionChecker;
use crate::engine::config::AdsorptionConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter, SiteStatus};
use crate::engine::rotation::{OrientationOptimizer, RotationOptimizer};
use crate::engine::sites::{HollowSiteFinder, OnTopSiteFinder, SiteFinder};
use crate::engine::state::{AdsorptionReport, RunStatus, SiteResult, SkipReason, SkippedSite};
use crate::engine::surface::select_surface_atoms;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The two energy oracles a run needs.
#[derive(Clone)]
pub struct OracleSet {
    /// Authoritative scorer for reference and final energies.
    pub scoring: Arc<dyn EnergyOracle>,
    /// Fast oracle driving the orientation search.
    pub surrogate: Arc<dyn EnergyOracle>,
}

/// Loads both structures from CIF files and runs [`run`].
///
/// # Errors
///
/// Returns [`EngineError::Input`] when either file cannot be read or parsed, and otherwise the
/// same errors as [`run`].
pub fn run_from_paths(
    substrate_path: &Path,
    adsorbate_path: &Path,
    config: &AdsorptionConfig,
    oracles: &OracleSet,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<AdsorptionReport, EngineError> {
    let (substrate, _) = CifFile::read_from_path(substrate_path).map_err(|e| {
        EngineError::structure_load("substrate", &substrate_path.to_string_lossy(), e)
    })?;
    let (adsorbate, _) = CifFile::read_from_path(adsorbate_path).map_err(|e| {
        EngineError::structure_load("adsorbate", &adsorbate_path.to_string_lossy(), e)
    })?;
    run(&substrate, &adsorbate, config, oracles, reporter, cancel)
}

/// Searches for favorable adsorption configurations of `adsorbate` on `substrate`.
///
/// Structure and reference-energy failures abort the run. Failures at individual sites are
/// recorded in [`AdsorptionReport::skipped`] and the run continues; empty intermediate results
/// and cancellation end the run early with the matching [`RunStatus`].
#[instrument(skip_all, name = "adsorption_workflow")]
pub fn run(
    substrate: &AtomicStructure,
    adsorbate: &AtomicStructure,
    config: &AdsorptionConfig,
    oracles: &OracleSet,
    reporter: &ProgressReporter,
    cancel: &CancellationToken,
) -> Result<AdsorptionReport, EngineError> {
    if substrate.is_empty() {
        return Err(EngineError::Input {
            message: "substrate contains no atoms".to_string(),
            source: None,
        });
    }
    if adsorbate.is_empty() {
        return Err(EngineError::Input {
            message: "adsorbate contains no atoms".to_string(),
            source: None,
        });
    }

    // === Phase 1: Slab construction and reference energies ===
    reporter.report(Progress::PhaseStart {
        name: "Preparing Slab",
    });
    let placement = &config.placement;
    let slab = Slab::build(substrate, placement.surface_axis, placement.vacuum);
    info!(
        atoms = slab.len(),
        axis = %placement.surface_axis,
        vacuum = placement.vacuum,
        "Built slab."
    );

    let slab_energy = oracles.scoring.evaluate(slab.structure())?;
    let isolated_adsorbate = adsorbate.with_pbc([false; 3]);
    let adsorbate_energy = oracles.scoring.evaluate(&isolated_adsorbate)?;
    info!(slab_energy, adsorbate_energy, "Reference energies computed.");
    reporter.report(Progress::PhaseFinish);

    let mut report = AdsorptionReport::new(slab, slab_energy, adsorbate_energy);

    // === Phase 2: Surface selection and site discovery ===
    reporter.report(Progress::PhaseStart {
        name: "Finding Sites",
    });
    report.surface_atoms = select_surface_atoms(
        report.slab.structure(),
        placement.surface_axis,
        placement.surface_search_depth,
        placement.side,
    );
    if report.surface_atoms.is_empty() {
        warn!("No surface atoms found; nothing to do.");
        reporter.report(Progress::PhaseFinish);
        report.status = RunStatus::NoSurfaceAtoms;
        return Ok(report);
    }

    for finder in site_finders(config) {
        let found = finder.find_sites(&report.surface_atoms);
        info!(site_type = %finder.site_type(), count = found.len(), "Site finder completed.");
        report.sites.extend(found);
    }
    reporter.report(Progress::PhaseFinish);
    if report.sites.is_empty() {
        warn!("No adsorption sites found; nothing to do.");
        report.status = RunStatus::NoSites;
        return Ok(report);
    }

    // === Phase 3: Per-site optimization and scoring ===
    reporter.report(Progress::PhaseStart {
        name: "Optimizing Sites",
    });
    let evaluator = SiteEvaluator {
        slab: &report.slab,
        adsorbate,
        height: placement.adsorption_height,
        optimizer: RotationOptimizer::from_config(oracles.surrogate.clone(), &config.rotation),
        checker: CollisionChecker::new(config.collision_threshold),
        scoring: oracles.scoring.as_ref(),
        slab_energy,
        adsorbate_energy,
        cancel,
        reporter,
        total_sites: report.sites.len(),
    };
    reporter.report(Progress::TaskStart {
        total_steps: report.sites.len() as u64,
    });
    let outcomes = evaluator.evaluate_all(&report.sites, config.parallel_sites);
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let mut cancelled = false;
    for outcome in outcomes {
        match outcome {
            SiteOutcome::Scored(result) => report.results.push(result),
            SiteOutcome::Skipped(skipped) => report.skipped.push(skipped),
            SiteOutcome::Cancelled => cancelled = true,
        }
    }

    // === Phase 4: Ranking ===
    report.rank_results();
    report.status = if cancelled {
        warn!(
            completed = report.results.len(),
            "Run cancelled; keeping completed sites."
        );
        RunStatus::Cancelled
    } else if report.results.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            "No site produced a valid configuration."
        );
        RunStatus::NoResults
    } else {
        RunStatus::Completed
    };

    info!(
        results = report.results.len(),
        collisions = report.collision_count(),
        failures = report.failure_count(),
        best = report.best().map(|r| r.adsorption_energy),
        "Adsorption workflow finished."
    );
    Ok(report)
}

fn site_finders(config: &AdsorptionConfig) -> Vec<Box<dyn SiteFinder>> {
    let placement = &config.placement;
    let sites = &config.sites;
    let mut finders: Vec<Box<dyn SiteFinder>> = Vec::new();
    if sites.find_hollow_sites {
        finders.push(Box::new(HollowSiteFinder::new(
            sites.knn_neighbors,
            sites.hollow_deduplication_distance,
            placement.surface_axis,
            placement.side,
        )));
    }
    if sites.find_on_top_sites {
        finders.push(Box::new(OnTopSiteFinder::new(
            &sites.on_top_target_species,
            placement.surface_axis,
            placement.side,
        )));
    }
    finders
}

enum SiteOutcome {
    Scored(SiteResult),
    Skipped(SkippedSite),
    Cancelled,
}

impl SiteOutcome {
    fn status(&self) -> Option<SiteStatus> {
        match self {
            SiteOutcome::Scored(result) => Some(SiteStatus::Scored {
                adsorption_energy: result.adsorption_energy,
            }),
            SiteOutcome::Skipped(skipped) => Some(match skipped.reason {
                SkipReason::Collision { .. } => SiteStatus::Collision,
                SkipReason::Failed(_) => SiteStatus::Failed,
            }),
            SiteOutcome::Cancelled => None,
        }
    }
}

struct SiteEvaluator<'a> {
    slab: &'a Slab,
    adsorbate: &'a AtomicStructure,
    height: f64,
    optimizer: RotationOptimizer,
    checker: CollisionChecker,
    scoring: &'a dyn EnergyOracle,
    slab_energy: f64,
    adsorbate_energy: f64,
    cancel: &'a CancellationToken,
    reporter: &'a ProgressReporter<'a>,
    total_sites: usize,
}

impl SiteEvaluator<'_> {
    /// Evaluates every site, keeping discovery order in the output.
    fn evaluate_all(&self, sites: &[AdsorptionSite], parallel: bool) -> Vec<SiteOutcome> {
        #[cfg(feature = "parallel")]
        if parallel {
            debug!(threads = rayon::current_num_threads(), "Processing sites in parallel.");
            return sites
                .par_iter()
                .enumerate()
                .map(|(i, site)| self.evaluate_or_stop(i + 1, site))
                .collect();
        }

        #[cfg(not(feature = "parallel"))]
        if parallel {
            debug!("Parallel site processing requested without the `parallel` feature.");
        }

        let mut outcomes = Vec::with_capacity(sites.len());
        for (i, site) in sites.iter().enumerate() {
            let outcome = self.evaluate_or_stop(i + 1, site);
            let stop = matches!(outcome, SiteOutcome::Cancelled);
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        outcomes
    }

    fn evaluate_or_stop(&self, site_index: usize, site: &AdsorptionSite) -> SiteOutcome {
        if self.cancel.is_cancelled() {
            return SiteOutcome::Cancelled;
        }
        self.reporter.status(format!(
            "Site {site_index}/{} ({})",
            self.total_sites, site.site_type
        ));

        let outcome = match self.evaluate(site_index, site) {
            Ok(result) => {
                info!(
                    site = site_index,
                    site_type = %site.site_type,
                    adsorption_energy = result.adsorption_energy,
                    min_separation = result.min_separation,
                    "Site scored."
                );
                SiteOutcome::Scored(result)
            }
            Err(EngineError::Cancelled) => return SiteOutcome::Cancelled,
            Err(EngineError::CollisionRejected {
                separation,
                threshold,
            }) => {
                warn!(
                    site = site_index,
                    site_type = %site.site_type,
                    separation,
                    threshold,
                    "Skipping site: adsorbate collides with the slab."
                );
                SiteOutcome::Skipped(SkippedSite {
                    site_index,
                    site_type: site.site_type,
                    reason: SkipReason::Collision { separation },
                })
            }
            Err(e) => {
                warn!(
                    site = site_index,
                    site_type = %site.site_type,
                    error = %e,
                    "Skipping site: evaluation failed."
                );
                SiteOutcome::Skipped(SkippedSite {
                    site_index,
                    site_type: site.site_type,
                    reason: SkipReason::Failed(e.to_string()),
                })
            }
        };
        if let Some(status) = outcome.status() {
            self.reporter.report(Progress::SiteFinished {
                site_index,
                site_type: site.site_type,
                status,
            });
        }
        self.reporter.report(Progress::TaskIncrement);
        outcome
    }

    fn evaluate(&self, site_index: usize, site: &AdsorptionSite) -> Result<SiteResult, EngineError> {
        let target = site.target_position(self.height);
        let placed = self.slab.place(self.adsorbate, &target).ok_or_else(|| {
            EngineError::Geometry("adsorbate has no center of mass".to_string())
        })?;

        let optimized = self.optimizer.optimize(&placed, &site.normal, self.cancel)?;
        let min_separation = self.checker.check(&optimized.system)?;

        let total_energy = self.scoring.evaluate(optimized.system.system())?;
        let adsorption_energy = total_energy - self.slab_energy - self.adsorbate_energy;
        let adsorbate_center_of_mass = optimized
            .system
            .adsorbate_center_of_mass()
            .ok_or_else(|| EngineError::Geometry("adsorbate has no center of mass".to_string()))?;

        debug!(
            site = site_index,
            surrogate_energy = optimized.info.surrogate_energy,
            evaluations = optimized.info.evaluations,
            total_energy,
            "Site configuration optimized."
        );

        Ok(SiteResult {
            site_index,
            site: site.clone(),
            optimized_system: optimized.system,
            adsorption_energy,
            min_separation,
            optimization_info: optimized.info,
            adsorbate_center_of_mass,
        })
    }
}
