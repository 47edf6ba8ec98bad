use crate::core::models::site::SiteType;
use nalgebra::{Matrix3, Point3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

pub const SLAB_STRUCTURE_FILE: &str = "01_built_surface.cif";
pub const SURFACE_ATOMS_FILE: &str = "surface_atoms.json";
pub const SITES_FILE: &str = "adsorption_sites.json";
pub const MESH_FILE: &str = "surface_mesh.json";
pub const SUMMARY_FILE: &str = "summary.csv";

/// File name of the optimized structure for the site discovered at `site_index`.
pub fn site_structure_file_name(site_index: usize, site_type: SiteType) -> String {
    format!("02_adsorbed_site_{site_index}_{site_type}.cif")
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Coordinates of the exposed surface atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceAtomsArtifact {
    pub coords: Vec<[f64; 3]>,
}

impl SurfaceAtomsArtifact {
    pub fn from_points(points: &[Point3<f64>]) -> Self {
        Self {
            coords: points.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }

    pub fn points(&self) -> Vec<Point3<f64>> {
        self.coords.iter().map(|c| Point3::from(*c)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub position: [f64; 3],
    pub energy: f64,
    #[serde(rename = "type")]
    pub site_type: String,
}

impl SiteRecord {
    /// Builds a record with the energy rounded to four decimals.
    pub fn new(position: &Point3<f64>, energy: f64, site_type: SiteType) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            energy: (energy * 1e4).round() / 1e4,
            site_type: site_type.to_string(),
        }
    }

    pub fn point(&self) -> Point3<f64> {
        Point3::from(self.position)
    }
}

/// Ranked sites with the slab cell; `cell` rows are lattice vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitesArtifact {
    pub cell: [[f64; 3]; 3],
    pub sites: Vec<SiteRecord>,
}

impl SitesArtifact {
    pub fn new(cell: &Matrix3<f64>, sites: Vec<SiteRecord>) -> Self {
        let row = |i: usize| [cell[(0, i)], cell[(1, i)], cell[(2, i)]];
        Self {
            cell: [row(0), row(1), row(2)],
            sites,
        }
    }

    /// The cell with lattice vectors as columns.
    pub fn cell_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|r, c| self.cell[c][r])
    }
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    let display = path.to_string_lossy().to_string();
    let file = File::create(path).map_err(|e| ArtifactError::Io {
        path: display.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| ArtifactError::Json {
        path: display.clone(),
        source: e,
    })?;
    writer.flush().map_err(|e| ArtifactError::Io {
        path: display,
        source: e,
    })
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, ArtifactError> {
    let path = path.as_ref();
    let display = path.to_string_lossy().to_string();
    let file = File::open(path).map_err(|e| ArtifactError::Io {
        path: display.clone(),
        source: e,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| ArtifactError::Json {
        path: display,
        source: e,
    })
}
