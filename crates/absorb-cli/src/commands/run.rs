use crate::cli::RunArgs;
use crate::config::{PartialRunConfig, RunConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use absorb::core::oracle::registry::OracleRegistry;
use absorb::engine::cancel::CancellationToken;
use absorb::engine::progress::ProgressReporter;
use absorb::engine::state::{AdsorptionReport, RunStatus};
use absorb::workflows::{
    adsorb::{self, OracleSet},
    export,
    mesh::{self, MeshAvailability},
};
use std::path::Path;
use tracing::{debug, info, warn};

const PRINTED_RESULTS: usize = 10;

pub async fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialRunConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;
    debug!("Final run configuration: {:?}", config);

    let oracles = build_oracles(&config)?;
    info!(
        scoring = oracles.scoring.name(),
        surrogate = oracles.surrogate.name(),
        "Energy oracles ready."
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received. Stopping after the current site...");
            signal_token.cancel();
        }
    });

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting adsorption site search...");
    info!("Invoking the core adsorption workflow...");

    let substrate = args.substrate.clone();
    let adsorbate = args.adsorbate.clone();
    let adsorption_config = config.adsorption.clone();
    let report = tokio::task::spawn_blocking(move || {
        adsorb::run_from_paths(
            &substrate,
            &adsorbate,
            &adsorption_config,
            &oracles,
            &reporter,
            &cancel,
        )
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Adsorption task failed: {}", e)))??;
    signal_task.abort();
    info!(tally = %progress_handler.tally(), "Site processing finished.");

    print_report(&report);

    info!("Writing results to {:?}", &args.output);
    let written = tokio::task::block_in_place(|| export::write_report(&report, &args.output))?;
    println!(
        "✓ {} file(s) written to: {}",
        written.len(),
        args.output.display()
    );

    match &config.mesh {
        Some(mesh_config) => {
            let outcome = tokio::task::block_in_place(|| {
                mesh::generate_from_directory(&args.output, mesh_config)
            })?;
            print_mesh_outcome(&outcome, &args.output);
        }
        None => info!("Mesh generation disabled; skipping."),
    }

    Ok(())
}

fn build_oracles(config: &RunConfig) -> Result<OracleSet> {
    let registry = OracleRegistry::with_defaults();
    Ok(OracleSet {
        scoring: registry.create(&config.scoring_oracle, &config.oracle_params)?,
        surrogate: registry.create(&config.surrogate_oracle, &config.oracle_params)?,
    })
}

fn print_report(report: &AdsorptionReport) {
    match report.status {
        RunStatus::Completed => println!(
            "Workflow complete: {} of {} site(s) scored ({} collision(s), {} failure(s)).",
            report.results.len(),
            report.sites.len(),
            report.collision_count(),
            report.failure_count()
        ),
        RunStatus::Cancelled => println!(
            "Warning: run cancelled after scoring {} of {} site(s); partial results kept.",
            report.results.len(),
            report.sites.len()
        ),
        status => println!("Warning: {}.", status),
    }

    for (rank, result) in report.results.iter().take(PRINTED_RESULTS).enumerate() {
        let p = result.site.position;
        println!(
            "  {:>3}. site {:>3} {:<7} E_ads = {:>10.4} eV  at ({:.3}, {:.3}, {:.3})  min sep {:.3} Å",
            rank + 1,
            result.site_index,
            result.site.site_type.to_string(),
            result.adsorption_energy,
            p.x,
            p.y,
            p.z,
            result.min_separation
        );
    }
    if report.results.len() > PRINTED_RESULTS {
        println!(
            "  ... {} more in summary.csv",
            report.results.len() - PRINTED_RESULTS
        );
    }
}

fn print_mesh_outcome(outcome: &MeshAvailability, output: &Path) {
    match outcome {
        MeshAvailability::Available(surface_mesh) => {
            let meta = &surface_mesh.metadata;
            println!(
                "✓ Surface mesh with {} vertices and {} triangles written to: {}",
                meta.vertex_count,
                meta.triangle_count,
                output.display()
            );
        }
        MeshAvailability::Unavailable(reason) => {
            println!("Warning: surface mesh unavailable: {}", reason);
        }
    }
}
