use crate::core::models::slab::SurfaceAxis;
use crate::core::utils::geometry::longest_edge;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use spade::{DelaunayTriangulation, HasPosition, Triangulation};
use tracing::debug;

/// A projected point that remembers its position in the input slice.
#[derive(Debug, Clone, Copy)]
pub(super) struct IndexedVertex {
    pub(super) position: spade::Point2<f64>,
    pub(super) index: usize,
}

impl HasPosition for IndexedVertex {
    type Scalar = f64;

    fn position(&self) -> spade::Point2<f64> {
        self.position
    }
}

/// Builds a 2D Delaunay triangulation of `points` projected along `axis`.
///
/// Fails with a geometry error when a point cannot be inserted (non-finite or out of range).
pub(super) fn delaunay(
    points: &[Point3<f64>],
    axis: SurfaceAxis,
) -> Result<DelaunayTriangulation<IndexedVertex>, EngineError> {
    let mut triangulation = DelaunayTriangulation::<IndexedVertex>::new();
    for (index, point) in points.iter().enumerate() {
        let projected = axis.project(point);
        triangulation
            .insert(IndexedVertex {
                position: spade::Point2::new(projected.x, projected.y),
                index,
            })
            .map_err(|e| EngineError::Geometry(format!("cannot triangulate point {index}: {e:?}")))?;
    }
    Ok(triangulation)
}

/// Delaunay triangles of `points` projected along `axis`, as index triples into `points`.
pub fn triangulate(points: &[Point3<f64>], axis: SurfaceAxis) -> Result<Vec<[usize; 3]>, EngineError> {
    if points.len() < 3 {
        return Err(EngineError::Geometry(format!(
            "at least 3 points are required for triangulation, got {}",
            points.len()
        )));
    }

    let triangulation = delaunay(points, axis)?;
    let triangles: Vec<[usize; 3]> = triangulation
        .inner_faces()
        .map(|face| face.vertices().map(|v| v.data().index))
        .collect();

    if triangles.is_empty() {
        return Err(EngineError::Geometry(
            "points are degenerate (collinear or coincident) in the surface plane".to_string(),
        ));
    }
    debug!(points = points.len(), triangles = triangles.len(), "Triangulated surface.");
    Ok(triangles)
}

/// Drops triangles whose longest 3D edge is longer than `max_edge_length`.
pub fn filter_long_edges(
    points: &[Point3<f64>],
    triangles: Vec<[usize; 3]>,
    max_edge_length: f64,
) -> Vec<[usize; 3]> {
    let before = triangles.len();
    let kept: Vec<[usize; 3]> = triangles
        .into_iter()
        .filter(|[a, b, c]| longest_edge(&points[*a], &points[*b], &points[*c]) <= max_edge_length)
        .collect();
    if kept.len() < before {
        debug!(
            removed = before - kept.len(),
            max_edge_length, "Filtered elongated triangles."
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_grid(n: usize, spacing: f64) -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                points.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 1.0));
            }
        }
        points
    }

    #[test]
    fn triangle_indices_are_within_bounds() {
        let points = square_grid(3, 1.5);
        let triangles = triangulate(&points, SurfaceAxis::Z).unwrap();
        assert_eq!(triangles.len(), 8);
        assert!(triangles.iter().flatten().all(|&i| i < points.len()));
    }

    #[test]
    fn three_points_form_one_triangle() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let triangles = triangulate(&points, SurfaceAxis::Z).unwrap();
        assert_eq!(triangles.len(), 1);
        let mut corners = triangles[0];
        corners.sort_unstable();
        assert_eq!(corners, [0, 1, 2]);
    }

    #[test]
    fn projection_drops_the_surface_axis() {
        let points = vec![
            Point3::new(0.0, 5.0, 0.0),
            Point3::new(1.0, 5.0, 0.0),
            Point3::new(0.0, 5.0, 1.0),
        ];
        assert!(triangulate(&points, SurfaceAxis::Y).is_ok());
        assert!(triangulate(&points, SurfaceAxis::Z).is_err());
    }

    #[test]
    fn too_few_points_is_a_geometry_error() {
        let points = vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)];
        assert!(matches!(
            triangulate(&points, SurfaceAxis::Z),
            Err(EngineError::Geometry(_))
        ));
    }

    #[test]
    fn collinear_points_are_a_geometry_error() {
        let points: Vec<_> = (0..5).map(|i| Point3::new(i as f64, i as f64, 0.0)).collect();
        assert!(matches!(
            triangulate(&points, SurfaceAxis::Z),
            Err(EngineError::Geometry(_))
        ));
    }

    #[test]
    fn long_edge_filter_removes_elongated_triangles() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(20.0, 20.0, 0.0),
        ];
        let triangles = triangulate(&points, SurfaceAxis::Z).unwrap();
        let kept = filter_long_edges(&points, triangles, 5.0);
        assert_eq!(kept.len(), 1);
        assert!(!kept[0].contains(&3));
    }
}
