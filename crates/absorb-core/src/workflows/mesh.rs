use crate::core::io::artifacts::{
    self, MESH_FILE, SITES_FILE, SURFACE_ATOMS_FILE, SitesArtifact, SurfaceAtomsArtifact,
};
use crate::engine::config::MeshConfig;
use crate::engine::error::EngineError;
use crate::engine::mesh::{Mesh, MeshBuilder};
use crate::engine::state::AdsorptionReport;
use nalgebra::Point3;
use std::path::Path;
use tracing::{info, instrument, warn};

const MIN_MESH_POINTS: usize = 3;

/// Outcome of mesh regeneration from persisted results.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshAvailability {
    Available(Mesh),
    /// The mesh could not be built; the reason is meant for display.
    Unavailable(String),
}

impl MeshAvailability {
    pub fn mesh(&self) -> Option<&Mesh> {
        match self {
            MeshAvailability::Available(mesh) => Some(mesh),
            MeshAvailability::Unavailable(_) => None,
        }
    }
}

/// Builds the mesh for an in-memory run report.
///
/// # Errors
///
/// Returns [`EngineError::Geometry`] when the surface atoms or scored sites cannot support a
/// mesh.
pub fn generate(report: &AdsorptionReport, config: &MeshConfig) -> Result<Mesh, EngineError> {
    let sites: Vec<Point3<f64>> = report.results.iter().map(|r| r.site.position).collect();
    let energies: Vec<f64> = report.results.iter().map(|r| r.adsorption_energy).collect();
    MeshBuilder::new(config.clone())?.build(&report.surface_atoms.positions, &sites, &energies)
}

/// Rebuilds `surface_mesh.json` from `surface_atoms.json` and `adsorption_sites.json` in
/// `result_dir`.
///
/// Missing or unreadable inputs, too few points, and mesh failures all yield
/// [`MeshAvailability::Unavailable`]; only a failure to write the mesh file is an error.
#[instrument(skip_all, name = "mesh_workflow")]
pub fn generate_from_directory(
    result_dir: &Path,
    config: &MeshConfig,
) -> Result<MeshAvailability, EngineError> {
    let surface: SurfaceAtomsArtifact = match artifacts::read_json(result_dir.join(SURFACE_ATOMS_FILE)) {
        Ok(surface) => surface,
        Err(e) => return Ok(unavailable(format!("cannot read surface atoms: {e}"))),
    };
    let sites: SitesArtifact = match artifacts::read_json(result_dir.join(SITES_FILE)) {
        Ok(sites) => sites,
        Err(e) => return Ok(unavailable(format!("cannot read adsorption sites: {e}"))),
    };

    if surface.coords.len() < MIN_MESH_POINTS {
        return Ok(unavailable(format!(
            "{} surface atoms; at least {MIN_MESH_POINTS} are required",
            surface.coords.len()
        )));
    }
    if sites.sites.len() < MIN_MESH_POINTS {
        return Ok(unavailable(format!(
            "{} adsorption sites; at least {MIN_MESH_POINTS} are required",
            sites.sites.len()
        )));
    }

    let builder = match MeshBuilder::new(config.clone()) {
        Ok(builder) => builder,
        Err(e) => return Ok(unavailable(e.to_string())),
    };
    let site_points: Vec<Point3<f64>> = sites.sites.iter().map(|s| s.point()).collect();
    let energies: Vec<f64> = sites.sites.iter().map(|s| s.energy).collect();
    let mesh = match builder.build(&surface.points(), &site_points, &energies) {
        Ok(mesh) => mesh,
        Err(e) => return Ok(unavailable(e.to_string())),
    };

    let mesh_path = result_dir.join(MESH_FILE);
    artifacts::write_json(&mesh, &mesh_path)?;
    info!(path = %mesh_path.display(), "Surface mesh written.");
    Ok(MeshAvailability::Available(mesh))
}

fn unavailable(reason: String) -> MeshAvailability {
    warn!(%reason, "Surface mesh unavailable.");
    MeshAvailability::Unavailable(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::artifacts::SiteRecord;
    use crate::core::models::site::SiteType;
    use nalgebra::Matrix3;
    use tempfile::tempdir;

    fn write_inputs(dir: &Path, surface: usize, sites: usize) {
        let surface_points: Vec<Point3<f64>> = (0..surface)
            .map(|k| Point3::new((k % 3) as f64 * 2.0, (k / 3) as f64 * 2.0, 10.0))
            .collect();
        artifacts::write_json(
            &SurfaceAtomsArtifact::from_points(&surface_points),
            dir.join(SURFACE_ATOMS_FILE),
        )
        .unwrap();
        let records = (0..sites)
            .map(|k| {
                let position = Point3::new(1.0 + (k % 2) as f64 * 2.0, 1.0 + (k / 2) as f64 * 2.0, 12.0);
                SiteRecord::new(&position, -0.1 * k as f64, SiteType::Hollow)
            })
            .collect();
        artifacts::write_json(
            &SitesArtifact::new(&Matrix3::from_diagonal_element(6.0), records),
            dir.join(SITES_FILE),
        )
        .unwrap();
    }

    #[test]
    fn builds_and_writes_mesh_from_directory() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), 9, 4);
        let outcome = generate_from_directory(dir.path(), &MeshConfig::default()).unwrap();
        let mesh = outcome.mesh().expect("mesh should be available");
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.metadata.num_sites, 4);

        let persisted: Mesh = artifacts::read_json(dir.path().join(MESH_FILE)).unwrap();
        assert_eq!(persisted.triangles, mesh.triangles);
        assert_eq!(persisted.colors, mesh.colors);
    }

    #[test]
    fn missing_files_are_unavailable() {
        let dir = tempdir().unwrap();
        let outcome = generate_from_directory(dir.path(), &MeshConfig::default()).unwrap();
        assert!(matches!(outcome, MeshAvailability::Unavailable(_)));
        assert!(!dir.path().join(MESH_FILE).exists());
    }

    #[test]
    fn too_few_sites_are_unavailable() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), 9, 2);
        let outcome = generate_from_directory(dir.path(), &MeshConfig::default()).unwrap();
        match outcome {
            MeshAvailability::Unavailable(reason) => assert!(reason.contains("adsorption sites")),
            other => panic!("expected unavailable mesh, got {other:?}"),
        }
    }

    #[test]
    fn collinear_surface_is_unavailable() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), 3, 4);
        let outcome = generate_from_directory(dir.path(), &MeshConfig::default()).unwrap();
        assert!(outcome.mesh().is_none());
    }
}
