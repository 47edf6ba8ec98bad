//! Surface energy mesh: triangulated surface atoms carrying interpolated site energies.

pub mod assembly;
pub mod interpolation;
pub mod triangulation;

pub use assembly::{EnergyRange, Mesh, MeshMetadata, MeshQuality, MeshSource};

use super::config::MeshConfig;
use super::error::EngineError;
use interpolation::{EnergyInterpolator, laplacian_smooth};
use nalgebra::Point3;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    config: MeshConfig,
}

impl MeshBuilder {
    pub fn new(config: MeshConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Builds a mesh whose vertices are `surface_atoms`, colored by the energy field of
    /// `sites`/`site_energies`.
    #[instrument(skip_all, name = "mesh_builder")]
    pub fn build(
        &self,
        surface_atoms: &[Point3<f64>],
        sites: &[Point3<f64>],
        site_energies: &[f64],
    ) -> Result<Mesh, EngineError> {
        let axis = self.config.surface_axis;

        let mut triangles = triangulation::triangulate(surface_atoms, axis)?;
        if let Some(max_edge_length) = self.config.max_edge_length {
            triangles = triangulation::filter_long_edges(surface_atoms, triangles, max_edge_length);
        }

        let interpolator = EnergyInterpolator::new(sites, site_energies, axis)?;
        let raw = interpolator.interpolate_all(surface_atoms);
        let energies = laplacian_smooth(&raw, &triangles, self.config.smooth_iterations);

        let mesh = assembly::assemble(
            surface_atoms,
            triangles,
            energies,
            self.config.color_scheme,
            MeshSource {
                surface_axis: axis,
                num_sites: sites.len(),
                num_surface_atoms: surface_atoms.len(),
            },
        );
        info!(
            vertices = mesh.metadata.vertex_count,
            triangles = mesh.metadata.triangle_count,
            "Surface mesh assembled."
        );
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::slab::SurfaceAxis;
    use crate::engine::config::ColorScheme;

    fn grid(n: usize, spacing: f64, height: f64) -> Vec<Point3<f64>> {
        (0..n * n)
            .map(|k| Point3::new((k / n) as f64 * spacing, (k % n) as f64 * spacing, height))
            .collect()
    }

    fn strip(columns: usize, rows: usize, height: f64) -> Vec<Point3<f64>> {
        (0..columns)
            .flat_map(|i| (0..rows).map(move |j| Point3::new(i as f64 * 2.0, j as f64 * 2.0, height)))
            .collect()
    }

    #[test]
    fn long_strip_with_collinear_sites_builds() {
        let surface = strip(2, 60, 5.0);
        let sites = strip(1, 50, 7.0);
        let energies: Vec<f64> = (0..sites.len()).map(|i| -0.01 * i as f64).collect();
        let mesh = MeshBuilder::default()
            .build(&surface, &sites, &energies)
            .unwrap();

        assert_eq!(mesh.vertices.len(), 120);
        assert!(mesh.metadata.triangle_count > 0);
        assert!(mesh.energies.iter().all(|e| e.is_finite()));
    }

    #[test]
    fn mesh_invariants_hold() {
        let surface = grid(4, 2.0, 5.0);
        let sites = grid(3, 3.0, 7.0);
        let energies: Vec<f64> = (0..sites.len()).map(|i| -0.1 * i as f64).collect();
        let mesh = MeshBuilder::default()
            .build(&surface, &sites, &energies)
            .unwrap();

        assert_eq!(mesh.vertices.len(), surface.len());
        assert_eq!(mesh.energies.len(), mesh.vertices.len());
        assert_eq!(mesh.colors.len(), mesh.vertices.len());
        assert!(mesh.triangles.iter().flatten().all(|&i| i < mesh.vertices.len()));
        assert!(mesh.energies.iter().all(|e| e.is_finite()));
        assert_eq!(mesh.metadata.num_sites, 9);
        assert_eq!(mesh.metadata.num_surface_atoms, 16);
    }

    #[test]
    fn unsmoothed_mesh_reproduces_site_energy_at_coincident_vertex() {
        let surface = grid(3, 2.0, 5.0);
        let sites = vec![
            Point3::new(0.0, 0.0, 7.0),
            Point3::new(4.0, 0.0, 7.0),
            Point3::new(0.0, 4.0, 7.0),
            Point3::new(4.0, 4.0, 7.0),
        ];
        let energies = vec![-1.0, -0.5, -0.25, 0.5];
        let builder = MeshBuilder::new(MeshConfig {
            surface_axis: SurfaceAxis::Z,
            max_edge_length: None,
            smooth_iterations: 0,
            color_scheme: ColorScheme::Hot,
        })
        .unwrap();
        let mesh = builder.build(&surface, &sites, &energies).unwrap();
        assert!((mesh.energies[0] + 1.0).abs() < 1e-9);
        assert!((mesh.energies[8] - 0.5).abs() < 1e-9);
        assert_eq!(mesh.colors[0], "#000000");
    }

    #[test]
    fn invalid_edge_length_is_rejected() {
        let config = MeshConfig {
            max_edge_length: Some(-1.0),
            ..MeshConfig::default()
        };
        assert!(matches!(
            MeshBuilder::new(config),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn collinear_surface_is_a_geometry_error() {
        let surface: Vec<_> = (0..4).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let result = MeshBuilder::default().build(&surface, &surface, &[0.0; 4]);
        assert!(matches!(result, Err(EngineError::Geometry(_))));
    }
}
