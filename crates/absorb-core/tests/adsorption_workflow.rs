mod common;

use absorb::core::models::site::SiteType;
use absorb::core::models::slab::SurfaceAxis;
use absorb::engine::cancel::CancellationToken;
use absorb::engine::config::{AdsorptionConfig, RotationMethod};
use absorb::engine::progress::{Progress, ProgressReporter, SiteStatus};
use absorb::engine::state::{RunStatus, SkipReason};
use absorb::workflows::adsorb::{self, OracleSet};
use common::{
    CancellingOracle, CombinedSystemFailingOracle, CountingOracle, default_oracles,
    diatomic_adsorbate, eight_atom_slab, hollow_only, square_slab,
};
use std::sync::{Arc, Mutex};

#[test]
fn hollow_sites_on_eight_atom_slab_produce_ranked_results() {
    let config = hollow_only().build().unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert!(!report.sites.is_empty());
    assert!(report.sites.iter().all(|s| s.site_type == SiteType::Hollow));
    assert!(!report.results.is_empty());

    let min_energy = report
        .results
        .iter()
        .map(|r| r.adsorption_energy)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(report.results[0].adsorption_energy, min_energy);
    assert!(
        report
            .results
            .windows(2)
            .all(|w| w[0].adsorption_energy <= w[1].adsorption_energy)
    );
}

#[test]
fn every_result_respects_collision_threshold_and_partition() {
    let config = hollow_only().build().unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    for result in &report.results {
        assert!(result.min_separation >= config.collision_threshold);
        assert_eq!(result.slab_atom_count(), 8);
        assert_eq!(result.optimized_system.adsorbate_atom_count(), 2);
        assert!(result.site_index >= 1 && result.site_index <= report.sites.len());
    }
}

#[test]
fn site_normals_point_outward() {
    let config = hollow_only().build().unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    let outward = SurfaceAxis::Z.outward(config.placement.side);
    assert!(report.sites.iter().all(|s| s.normal.dot(&outward) >= 0.0));
}

#[test]
fn sphere_rotation_spends_forty_evaluations_per_site() {
    let config = hollow_only()
        .rotation_method(RotationMethod::Sphere)
        .rotation_count(10)
        .rotation_step(90.0)
        .build()
        .unwrap();
    let base = default_oracles();
    let counting = Arc::new(CountingOracle::new(base.surrogate.clone()));
    let oracles = OracleSet {
        scoring: base.scoring,
        surrogate: counting.clone(),
    };

    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &oracles,
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(!report.sites.is_empty());
    assert_eq!(counting.calls(), 40 * report.sites.len());
    for result in &report.results {
        assert_eq!(result.optimization_info.method, RotationMethod::Sphere);
        assert_eq!(result.optimization_info.evaluations, 40);
        assert!(result.optimization_info.axis().is_some());
    }
}

#[test]
fn missing_target_species_yields_no_sites() {
    let config = hollow_only()
        .find_hollow_sites(false)
        .find_on_top_sites(true)
        .on_top_target_species("O")
        .build()
        .unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.status, RunStatus::NoSites);
    assert!(report.results.is_empty());
    assert_eq!(report.surface_atoms.len(), 4);
}

#[test]
fn on_top_sites_sit_on_matching_atoms() {
    let config = hollow_only()
        .find_hollow_sites(false)
        .find_on_top_sites(true)
        .on_top_target_species("A")
        .build()
        .unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.sites.len(), report.surface_atoms.len());
    for (site, position) in report.sites.iter().zip(&report.surface_atoms.positions) {
        assert_eq!(site.position, *position);
        assert_eq!(site.site_type, SiteType::OnTop);
    }
}

#[test]
fn cancelled_run_stops_before_processing_sites() {
    let config = hollow_only().build().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &cancel,
    )
    .unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert!(report.results.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn oracle_failures_skip_every_site_without_aborting() {
    let config = hollow_only().build().unwrap();
    let base = default_oracles();
    let oracles = OracleSet {
        scoring: Arc::new(CombinedSystemFailingOracle::new(base.scoring)),
        surrogate: Arc::new(CombinedSystemFailingOracle::new(base.surrogate)),
    };

    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &oracles,
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(report.status, RunStatus::NoResults);
    assert!(!report.sites.is_empty());
    assert!(report.results.is_empty());
    assert_eq!(report.failure_count(), report.sites.len());
    assert_eq!(report.collision_count(), 0);
    assert!(
        report
            .skipped
            .iter()
            .all(|s| matches!(s.reason, SkipReason::Failed(_)))
    );
}

#[test]
fn strict_collision_threshold_skips_sites_as_collisions() {
    let config = hollow_only().collision_threshold(3.0).build().unwrap();
    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(!report.skipped.is_empty());
    assert!(report.collision_count() > 0);
    for skipped in &report.skipped {
        if let SkipReason::Collision { separation } = skipped.reason {
            assert!(separation < config.collision_threshold);
        }
    }
    assert_eq!(report.results.len() + report.skipped.len(), report.sites.len());
}

#[test]
fn cancellation_mid_run_keeps_ranked_completed_sites() {
    let config = hollow_only().build().unwrap();
    let cancel = CancellationToken::new();
    let base = default_oracles();
    // Two reference energies, then one final score per completed site.
    let oracles = OracleSet {
        scoring: Arc::new(CancellingOracle::new(base.scoring, cancel.clone(), 4)),
        surrogate: base.surrogate,
    };

    let report = adsorb::run(
        &square_slab(3, 2),
        &diatomic_adsorbate(),
        &config,
        &oracles,
        &ProgressReporter::new(),
        &cancel,
    )
    .unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.results.len(), 2);
    assert!(report.results.len() + report.skipped.len() < report.sites.len());
    assert!(
        report
            .results
            .windows(2)
            .all(|w| w[0].adsorption_energy <= w[1].adsorption_energy)
    );
}

#[test]
fn progress_reports_one_increment_per_site() {
    let config = hollow_only().build().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let reporter = ProgressReporter::with_callback(Box::new(move |event: Progress| {
        sink.lock().unwrap().push(event);
    }));

    let report = adsorb::run(
        &eight_atom_slab(),
        &diatomic_adsorbate(),
        &config,
        &default_oracles(),
        &reporter,
        &CancellationToken::new(),
    )
    .unwrap();

    let events = events.lock().unwrap();
    let increments = events
        .iter()
        .filter(|e| matches!(e, Progress::TaskIncrement))
        .count();
    assert_eq!(increments, report.sites.len());
    assert!(matches!(events.first(), Some(Progress::PhaseStart { .. })));

    let scored = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                Progress::SiteFinished {
                    status: SiteStatus::Scored { .. },
                    ..
                }
            )
        })
        .count();
    let skipped = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                Progress::SiteFinished {
                    status: SiteStatus::Collision | SiteStatus::Failed,
                    ..
                }
            )
        })
        .count();
    assert_eq!(scored, report.results.len());
    assert_eq!(skipped, report.skipped.len());
}

#[test]
fn empty_adsorbate_is_an_input_error() {
    let config = hollow_only().build().unwrap();
    let empty = absorb::core::models::structure::AtomicStructure::molecule(Vec::new());
    let result = adsorb::run(
        &eight_atom_slab(),
        &empty,
        &config,
        &default_oracles(),
        &ProgressReporter::new(),
        &CancellationToken::new(),
    );
    assert!(matches!(
        result,
        Err(absorb::engine::error::EngineError::Input { .. })
    ));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_sites_match_sequential_results() {
    let sequential = hollow_only().build().unwrap();
    let parallel = hollow_only().parallel_sites(true).build().unwrap();
    let run = |config: &AdsorptionConfig| {
        adsorb::run(
            &common::square_slab(3, 2),
            &diatomic_adsorbate(),
            config,
            &default_oracles(),
            &ProgressReporter::new(),
            &CancellationToken::new(),
        )
        .unwrap()
    };
    let a = run(&sequential);
    let b = run(&parallel);
    let indices = |r: &absorb::engine::state::AdsorptionReport| {
        r.results.iter().map(|x| x.site_index).collect::<Vec<_>>()
    };
    assert_eq!(indices(&a), indices(&b));
}
