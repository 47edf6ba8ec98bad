use crate::core::io::artifacts::{
    self, ArtifactError, SITES_FILE, SLAB_STRUCTURE_FILE, SUMMARY_FILE, SURFACE_ATOMS_FILE,
    SiteRecord, SitesArtifact, SurfaceAtomsArtifact,
};
use crate::core::io::cif::CifFile;
use crate::core::io::summary::{self, SummaryRow};
use crate::core::io::traits::StructureFile;
use crate::core::models::structure::AtomicStructure;
use crate::engine::error::EngineError;
use crate::engine::state::AdsorptionReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Writes the run artifacts into `output_dir`, creating it if needed.
///
/// Returns the paths written, in write order.
#[instrument(skip_all, name = "export_results")]
pub fn write_report(
    report: &AdsorptionReport,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, EngineError> {
    fs::create_dir_all(output_dir).map_err(|e| ArtifactError::Io {
        path: output_dir.to_string_lossy().to_string(),
        source: e,
    })?;
    let mut written = Vec::new();

    let slab_path = output_dir.join(SLAB_STRUCTURE_FILE);
    write_structure(report.slab.structure(), &slab_path)?;
    written.push(slab_path);

    for result in &report.results {
        let path = output_dir.join(artifacts::site_structure_file_name(
            result.site_index,
            result.site.site_type,
        ));
        write_structure(result.optimized_system.system(), &path)?;
        written.push(path);
    }

    let surface_path = output_dir.join(SURFACE_ATOMS_FILE);
    artifacts::write_json(
        &SurfaceAtomsArtifact::from_points(&report.surface_atoms.positions),
        &surface_path,
    )?;
    written.push(surface_path);

    let sites_path = output_dir.join(SITES_FILE);
    artifacts::write_json(&sites_artifact(report), &sites_path)?;
    written.push(sites_path);

    let summary_path = output_dir.join(SUMMARY_FILE);
    summary::write_summary(&summary_path, &summary_rows(report))?;
    written.push(summary_path);

    info!(
        files = written.len(),
        directory = %output_dir.display(),
        "Results exported."
    );
    Ok(written)
}

/// Ranked site positions with their adsorption energies.
pub fn sites_artifact(report: &AdsorptionReport) -> SitesArtifact {
    let records = report
        .results
        .iter()
        .map(|r| SiteRecord::new(&r.site.position, r.adsorption_energy, r.site.site_type))
        .collect();
    SitesArtifact::new(report.slab.structure().cell(), records)
}

pub fn summary_rows(report: &AdsorptionReport) -> Vec<SummaryRow> {
    report
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let info = &r.optimization_info;
            SummaryRow {
                rank: i + 1,
                site_index: r.site_index,
                site_type: r.site.site_type.to_string(),
                adsorption_energy: r.adsorption_energy,
                min_separation: r.min_separation,
                method: info.method.to_string(),
                optimal_angle: info.angle(),
                optimal_axis: info
                    .axis()
                    .map(|a| format!("{:.6} {:.6} {:.6}", a.x, a.y, a.z)),
                surrogate_energy: info.surrogate_energy,
                evaluations: info.evaluations,
            }
        })
        .collect()
}

fn write_structure(structure: &AtomicStructure, path: &Path) -> Result<(), EngineError> {
    CifFile::write_structure_to_path(structure, path).map_err(|e| EngineError::StructureWrite {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
