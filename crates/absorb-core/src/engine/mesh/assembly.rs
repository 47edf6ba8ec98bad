use crate::core::models::slab::SurfaceAxis;
use crate::core::utils::geometry::{triangle_area, triangle_aspect_ratio};
use crate::engine::config::ColorScheme;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl EnergyRange {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            min,
            max,
            mean,
            std: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshQuality {
    pub mean_area: f64,
    pub total_area: f64,
    pub mean_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
}

impl MeshQuality {
    pub fn measure(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> Self {
        if triangles.is_empty() {
            return Self::default();
        }
        let (mut total_area, mut total_ratio, mut max_ratio) = (0.0, 0.0, 0.0_f64);
        for &[a, b, c] in triangles {
            let (a, b, c) = (&vertices[a], &vertices[b], &vertices[c]);
            total_area += triangle_area(a, b, c);
            let ratio = triangle_aspect_ratio(a, b, c);
            total_ratio += ratio;
            max_ratio = max_ratio.max(ratio);
        }
        let n = triangles.len() as f64;
        Self {
            mean_area: total_area / n,
            total_area,
            mean_aspect_ratio: total_ratio / n,
            max_aspect_ratio: max_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshMetadata {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub energy_range: EnergyRange,
    pub surface_axis: usize,
    pub num_sites: usize,
    pub num_surface_atoms: usize,
    pub quality: MeshQuality,
}

/// A colored triangle mesh over the surface, serialized as `surface_mesh.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[usize; 3]>,
    pub energies: Vec<f64>,
    pub colors: Vec<String>,
    pub metadata: MeshMetadata,
}

/// Inputs counted into the mesh metadata besides the mesh itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshSource {
    pub surface_axis: SurfaceAxis,
    pub num_sites: usize,
    pub num_surface_atoms: usize,
}

pub fn assemble(
    vertices: &[Point3<f64>],
    triangles: Vec<[usize; 3]>,
    energies: Vec<f64>,
    scheme: ColorScheme,
    source: MeshSource,
) -> Mesh {
    let metadata = MeshMetadata {
        vertex_count: vertices.len(),
        triangle_count: triangles.len(),
        energy_range: EnergyRange::from_values(&energies),
        surface_axis: source.surface_axis.index(),
        num_sites: source.num_sites,
        num_surface_atoms: source.num_surface_atoms,
        quality: MeshQuality::measure(vertices, &triangles),
    };
    Mesh {
        vertices: vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
        triangles,
        colors: color_map(&energies, scheme),
        energies,
        metadata,
    }
}

/// One `#rrggbb` color per value, normalized over the value range.
///
/// A constant field maps every value to the middle of the scheme.
pub fn color_map(values: &[f64], scheme: ColorScheme) -> Vec<String> {
    let range = EnergyRange::from_values(values);
    let span = range.max - range.min;
    values
        .iter()
        .map(|&v| {
            let t = if span > 0.0 { (v - range.min) / span } else { 0.5 };
            let [r, g, b] = scheme_rgb(scheme, t.clamp(0.0, 1.0));
            format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
        })
        .collect()
}

fn channel(fraction: f64) -> u8 {
    (255.0 * fraction.clamp(0.0, 1.0)).round() as u8
}

fn scheme_rgb(scheme: ColorScheme, t: f64) -> [f64; 3] {
    match scheme {
        // Low energy green, midpoint yellow, high energy red.
        ColorScheme::GreenYellowRed => {
            if t < 0.5 {
                [2.0 * t, 1.0, 0.0]
            } else {
                [1.0, 2.0 - 2.0 * t, 0.0]
            }
        }
        ColorScheme::Hot => {
            if t < 0.33 {
                [t / 0.33, 0.0, 0.0]
            } else if t < 0.67 {
                [1.0, (t - 0.33) / 0.34, 0.0]
            } else {
                [1.0, 1.0, (t - 0.67) / 0.33]
            }
        }
        ColorScheme::Cool => [t, 1.0 - t, 1.0],
    }
}
