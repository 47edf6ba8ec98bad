use super::triangulation::{IndexedVertex, delaunay};
use crate::core::models::slab::SurfaceAxis;
use crate::engine::error::EngineError;
use itertools::Itertools;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;
use spade::{DelaunayTriangulation, FloatTriangulation, Triangulation};
use tracing::{debug, trace};

/// Piecewise-linear energy field over the projected site positions.
///
/// Inside the convex hull of the sites the field is the barycentric interpolation over their
/// Delaunay triangulation; outside it (or for degenerate site layouts) the nearest site's
/// energy is used.
pub struct EnergyInterpolator {
    axis: SurfaceAxis,
    energies: Vec<f64>,
    triangulation: Option<DelaunayTriangulation<IndexedVertex>>,
    nearest: ImmutableKdTree<f64, 2>,
}

impl EnergyInterpolator {
    pub fn new(
        sites: &[Point3<f64>],
        energies: &[f64],
        axis: SurfaceAxis,
    ) -> Result<Self, EngineError> {
        if sites.is_empty() {
            return Err(EngineError::Geometry(
                "energy interpolation requires at least one site".to_string(),
            ));
        }
        if sites.len() != energies.len() {
            return Err(EngineError::Geometry(format!(
                "{} sites but {} energies",
                sites.len(),
                energies.len()
            )));
        }
        if energies.iter().any(|e| !e.is_finite()) {
            return Err(EngineError::Geometry(
                "site energies must be finite".to_string(),
            ));
        }

        let triangulation = if sites.len() >= 3 {
            let triangulation = delaunay(sites, axis)?;
            (triangulation.num_inner_faces() > 0).then_some(triangulation)
        } else {
            None
        };
        if triangulation.is_none() {
            debug!(
                sites = sites.len(),
                "Sites do not span an area; using nearest-site interpolation only."
            );
        }

        let projected: Vec<[f64; 2]> = sites
            .iter()
            .map(|p| {
                let q = axis.project(p);
                [q.x, q.y]
            })
            .collect();
        let nearest = ImmutableKdTree::new_from_slice(&projected);

        Ok(Self {
            axis,
            energies: energies.to_vec(),
            triangulation,
            nearest,
        })
    }

    pub fn interpolate(&self, point: &Point3<f64>) -> f64 {
        let q = self.axis.project(point);
        let linear = self.triangulation.as_ref().and_then(|triangulation| {
            triangulation
                .barycentric()
                .interpolate(
                    |v| self.energies[v.data().index],
                    spade::Point2::new(q.x, q.y),
                )
                .filter(|e| e.is_finite())
        });
        linear.unwrap_or_else(|| {
            let hit = self.nearest.nearest_one::<SquaredEuclidean>(&[q.x, q.y]);
            trace!(site = hit.item, "Nearest-site fallback.");
            self.energies[hit.item as usize]
        })
    }

    pub fn interpolate_all(&self, points: &[Point3<f64>]) -> Vec<f64> {
        points.iter().map(|p| self.interpolate(p)).collect()
    }
}

/// Synchronous Laplacian smoothing over triangle adjacency.
///
/// Each round replaces every vertex value with the mean of itself and the average of its
/// neighbors. Vertices not referenced by any triangle keep their value.
pub fn laplacian_smooth(values: &[f64], triangles: &[[usize; 3]], iterations: usize) -> Vec<f64> {
    let mut current = values.to_vec();
    if iterations == 0 || triangles.is_empty() {
        return current;
    }

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); values.len()];
    for triangle in triangles {
        for (&a, &b) in triangle.iter().tuple_combinations() {
            if a == b {
                continue;
            }
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
            }
            if !neighbors[b].contains(&a) {
                neighbors[b].push(a);
            }
        }
    }

    for _ in 0..iterations {
        current = current
            .iter()
            .zip(&neighbors)
            .map(|(&value, adjacent)| {
                if adjacent.is_empty() {
                    return value;
                }
                let mean = adjacent.iter().map(|&j| current[j]).sum::<f64>() / adjacent.len() as f64;
                (value + mean) / 2.0
            })
            .collect();
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn square_sites() -> (Vec<Point3<f64>>, Vec<f64>) {
        let sites = vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(2.0, 0.0, 3.0),
            Point3::new(0.0, 2.0, 3.0),
            Point3::new(2.0, 2.0, 3.0),
        ];
        (sites, vec![-1.0, 0.0, 1.0, 2.0])
    }

    #[test]
    fn exact_site_positions_return_site_energies() {
        let (sites, energies) = square_sites();
        let interpolator = EnergyInterpolator::new(&sites, &energies, SurfaceAxis::Z).unwrap();
        for (site, energy) in sites.iter().zip(&energies) {
            assert!(f64_approx_equal(interpolator.interpolate(site), *energy));
        }
    }

    #[test]
    fn interior_points_are_linear() {
        let (sites, energies) = square_sites();
        let interpolator = EnergyInterpolator::new(&sites, &energies, SurfaceAxis::Z).unwrap();
        // Energies form the plane e = x/2 + y - 1, so any triangulation reproduces it.
        let value = interpolator.interpolate(&Point3::new(1.0, 0.5, 0.0));
        assert!(f64_approx_equal(value, 0.0));
    }

    #[test]
    fn outside_hull_uses_nearest_site() {
        let (sites, energies) = square_sites();
        let interpolator = EnergyInterpolator::new(&sites, &energies, SurfaceAxis::Z).unwrap();
        assert!(f64_approx_equal(
            interpolator.interpolate(&Point3::new(5.0, 5.0, 0.0)),
            2.0
        ));
        assert!(f64_approx_equal(
            interpolator.interpolate(&Point3::new(-3.0, -0.5, 0.0)),
            -1.0
        ));
    }

    #[test]
    fn collinear_sites_fall_back_to_nearest() {
        let sites = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let interpolator =
            EnergyInterpolator::new(&sites, &[3.0, 4.0, 5.0], SurfaceAxis::Z).unwrap();
        let values = interpolator.interpolate_all(&[Point3::new(1.9, 1.0, 0.0), Point3::new(0.2, -1.0, 0.0)]);
        assert_eq!(values, vec![5.0, 3.0]);
    }

    #[test]
    fn many_sites_on_one_line_use_nearest_lookup() {
        let sites: Vec<Point3<f64>> = (0..50).map(|i| Point3::new(i as f64, 0.0, 2.0)).collect();
        let energies: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let interpolator = EnergyInterpolator::new(&sites, &energies, SurfaceAxis::Z).unwrap();

        assert!(f64_approx_equal(
            interpolator.interpolate(&Point3::new(10.2, 3.0, 0.0)),
            10.0
        ));
        assert!(f64_approx_equal(
            interpolator.interpolate(&Point3::new(60.0, -1.0, 0.0)),
            49.0
        ));
    }

    #[test]
    fn single_site_is_constant_field() {
        let interpolator =
            EnergyInterpolator::new(&[Point3::origin()], &[-0.7], SurfaceAxis::Z).unwrap();
        assert!(f64_approx_equal(
            interpolator.interpolate(&Point3::new(9.0, -4.0, 1.0)),
            -0.7
        ));
    }

    #[test]
    fn empty_sites_are_rejected() {
        assert!(EnergyInterpolator::new(&[], &[], SurfaceAxis::Z).is_err());
    }

    #[test]
    fn zero_smoothing_iterations_is_identity() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(laplacian_smooth(&values, &[[0, 1, 2]], 0), values);
    }

    #[test]
    fn smoothing_averages_with_neighbors() {
        let values = vec![0.0, 3.0, 6.0, 9.0];
        let smoothed = laplacian_smooth(&values, &[[0, 1, 2]], 1);
        assert!(f64_approx_equal(smoothed[0], (0.0 + 4.5) / 2.0));
        assert!(f64_approx_equal(smoothed[1], (3.0 + 3.0) / 2.0));
        assert!(f64_approx_equal(smoothed[2], (6.0 + 1.5) / 2.0));
        assert_eq!(smoothed[3], 9.0);
    }

    #[test]
    fn smoothing_k_then_zero_equals_k() {
        let values = vec![0.0, 1.0, 5.0, 2.0];
        let triangles = [[0, 1, 2], [1, 2, 3]];
        let twice = laplacian_smooth(&values, &triangles, 2);
        assert_eq!(laplacian_smooth(&twice, &triangles, 0), twice);
    }
}
