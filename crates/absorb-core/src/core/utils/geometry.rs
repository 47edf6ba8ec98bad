use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::f64::consts::PI;

/// Rotation of `angle_degrees` about `axis`; the identity for a zero-length axis.
pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_degrees: f64) -> Rotation3<f64> {
    Unit::try_new(*axis, f64::EPSILON)
        .map(|unit| Rotation3::from_axis_angle(&unit, angle_degrees.to_radians()))
        .unwrap_or_else(Rotation3::identity)
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// `n` nearly uniform unit vectors on the sphere (Fibonacci lattice, half-index offset).
pub fn fibonacci_sphere(n: usize) -> Vec<Vector3<f64>> {
    let golden = PI * (1.0 + 5f64.sqrt());
    (0..n)
        .map(|i| {
            let offset = i as f64 + 0.5;
            let phi = (1.0 - 2.0 * offset / n as f64).acos();
            let theta = golden * offset;
            Vector3::new(
                theta.cos() * phi.sin(),
                theta.sin() * phi.sin(),
                phi.cos(),
            )
        })
        .collect()
}

fn edge_lengths(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> [f64; 3] {
    [(b - a).norm(), (c - b).norm(), (a - c).norm()]
}

pub fn triangle_area(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    0.5 * (b - a).cross(&(c - a)).norm()
}

pub fn longest_edge(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    edge_lengths(a, b, c).into_iter().fold(0.0, f64::max)
}

/// Longest over shortest edge; 1.0 for an equilateral triangle.
pub fn triangle_aspect_ratio(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let edges = edge_lengths(a, b, c);
    let longest = edges.into_iter().fold(0.0, f64::max);
    let shortest = edges.into_iter().fold(f64::INFINITY, f64::min);
    longest / (shortest + 1e-10)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn rotation_about_z_maps_x_to_y() {
        let rot = rotation_from_axis_angle(&Vector3::new(0.0, 0.0, 2.0), 90.0);
        let v = rot * Vector3::x();
        assert!(f64_approx_equal(v.x, 0.0));
        assert!(f64_approx_equal(v.y, 1.0));
    }

    #[test]
    fn zero_axis_yields_identity() {
        let rot = rotation_from_axis_angle(&Vector3::zeros(), 45.0);
        assert_eq!(rot, Rotation3::identity());
    }

    #[test]
    fn centroid_of_empty_slice_is_none() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)]).unwrap();
        assert_eq!(c, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn fibonacci_points_are_unit_and_span_both_hemispheres() {
        let points = fibonacci_sphere(50);
        assert_eq!(points.len(), 50);
        assert!(points.iter().all(|p| f64_approx_equal(p.norm(), 1.0)));
        assert!(points.iter().any(|p| p.z > 0.9));
        assert!(points.iter().any(|p| p.z < -0.9));
        let mean_z: f64 = points.iter().map(|p| p.z).sum::<f64>() / 50.0;
        assert!(mean_z.abs() < 1e-9);
    }

    #[test]
    fn first_fibonacci_point_follows_half_offset() {
        let points = fibonacci_sphere(10);
        assert!(f64_approx_equal(points[0].z, 1.0 - 1.0 / 10.0));
    }

    #[test]
    fn triangle_metrics_for_right_triangle() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 0.0, 0.0);
        let c = Point3::new(0.0, 4.0, 0.0);
        assert!(f64_approx_equal(triangle_area(&a, &b, &c), 6.0));
        assert!(f64_approx_equal(longest_edge(&a, &b, &c), 5.0));
        assert!((triangle_aspect_ratio(&a, &b, &c) - 5.0 / 3.0).abs() < 1e-8);
    }
}
