use super::SiteFinder;
use crate::core::models::site::{AdsorptionSite, SiteType};
use crate::core::models::slab::{SurfaceAxis, SurfaceSide};
use crate::core::utils::geometry::centroid;
use crate::engine::surface::SurfaceAtoms;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::{Point3, Vector3};
use tracing::{info, warn};

const DEGENERATE_NORMAL: f64 = 1e-6;

/// Sites at the centroids of nearest-neighbor clusters in the projected surface plane.
#[derive(Debug, Clone, PartialEq)]
pub struct HollowSiteFinder {
    knn_neighbors: usize,
    deduplication_distance: f64,
    axis: SurfaceAxis,
    side: SurfaceSide,
}

impl HollowSiteFinder {
    pub fn new(
        knn_neighbors: usize,
        deduplication_distance: f64,
        axis: SurfaceAxis,
        side: SurfaceSide,
    ) -> Self {
        Self {
            knn_neighbors,
            deduplication_distance,
            axis,
            side,
        }
    }

    /// Normal of the plane through the first three cluster atoms, oriented outward; falls back
    /// to `outward` when fewer than two neighbors are used or the atoms are collinear.
    fn cluster_normal(&self, cluster: &[Point3<f64>], outward: &Vector3<f64>) -> Vector3<f64> {
        if self.knn_neighbors < 2 || cluster.len() < 3 {
            return *outward;
        }
        let cross = (cluster[1] - cluster[0]).cross(&(cluster[2] - cluster[0]));
        let norm = cross.norm();
        if norm <= DEGENERATE_NORMAL {
            return *outward;
        }
        let normal = cross / norm;
        if normal.dot(outward) < 0.0 { -normal } else { normal }
    }

    fn deduplicate(&self, candidates: Vec<AdsorptionSite>) -> Vec<AdsorptionSite> {
        let mut accepted: Vec<AdsorptionSite> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let duplicate = accepted.iter().any(|site| {
                (site.position - candidate.position).norm() < self.deduplication_distance
            });
            if !duplicate {
                accepted.push(candidate);
            }
        }
        accepted
    }
}

impl SiteFinder for HollowSiteFinder {
    fn site_type(&self) -> SiteType {
        SiteType::Hollow
    }

    fn find_sites(&self, surface: &SurfaceAtoms) -> Vec<AdsorptionSite> {
        let cluster_size = self.knn_neighbors + 1;
        if surface.len() < cluster_size {
            warn!(
                surface_atoms = surface.len(),
                required = cluster_size,
                "Not enough surface atoms for hollow site detection."
            );
            return Vec::new();
        }

        let projected: Vec<[f64; 2]> = surface
            .positions
            .iter()
            .map(|p| {
                let q = self.axis.project(p);
                [q.x, q.y]
            })
            .collect();
        let tree: ImmutableKdTree<f64, 2> = ImmutableKdTree::new_from_slice(&projected);
        let outward = self.axis.outward(self.side);

        let candidates: Vec<AdsorptionSite> = projected
            .iter()
            .filter_map(|query| {
                let mut neighbours = tree.nearest_n::<SquaredEuclidean>(query, cluster_size);
                neighbours.sort_by(|a, b| {
                    a.distance
                        .total_cmp(&b.distance)
                        .then_with(|| a.item.cmp(&b.item))
                });
                let cluster: Vec<Point3<f64>> = neighbours
                    .iter()
                    .map(|n| surface.positions[n.item as usize])
                    .collect();
                let center = centroid(&cluster)?;
                let normal = self.cluster_normal(&cluster, &outward);
                Some(AdsorptionSite::new(center, normal, SiteType::Hollow))
            })
            .collect();

        let sites = self.deduplicate(candidates);
        info!(
            candidates = projected.len(),
            unique = sites.len(),
            "Found hollow sites."
        );
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_surface(z: f64) -> SurfaceAtoms {
        let positions = vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(2.0, 0.0, z),
            Point3::new(0.0, 2.0, z),
            Point3::new(2.0, 2.0, z),
        ];
        SurfaceAtoms {
            indices: (0..positions.len()).collect(),
            species: vec!["A".into(); positions.len()],
            positions,
        }
    }

    fn strip_surface(columns: usize, rows: usize, z: f64) -> SurfaceAtoms {
        let positions: Vec<Point3<f64>> = (0..columns)
            .flat_map(|i| (0..rows).map(move |j| Point3::new(i as f64 * 2.0, j as f64 * 2.0, z)))
            .collect();
        SurfaceAtoms {
            indices: (0..positions.len()).collect(),
            species: vec!["A".into(); positions.len()],
            positions,
        }
    }

    #[test]
    fn long_strip_supercell_yields_sites() {
        let finder = HollowSiteFinder::new(2, 1.0, SurfaceAxis::Z, SurfaceSide::Top);
        let sites = finder.find_sites(&strip_surface(2, 60, 5.0));

        assert!(!sites.is_empty());
        for site in &sites {
            assert!(site.position.x >= 0.0 && site.position.x <= 2.0);
            assert!(site.position.y >= 0.0 && site.position.y <= 118.0);
            assert!(site.normal.dot(&Vector3::z()) >= 0.0);
        }
    }

    #[test]
    fn cluster_centroids_become_sites() {
        let finder = HollowSiteFinder::new(2, 0.5, SurfaceAxis::Z, SurfaceSide::Top);
        let sites = finder.find_sites(&square_surface(5.0));
        assert_eq!(sites.len(), 4);
        let first = &sites[0];
        assert!((first.position - Point3::new(2.0 / 3.0, 2.0 / 3.0, 5.0)).norm() < 1e-9);
        assert_eq!(first.site_type, SiteType::Hollow);
    }

    #[test]
    fn accepted_sites_respect_deduplication_distance() {
        let finder = HollowSiteFinder::new(2, 1.0, SurfaceAxis::Z, SurfaceSide::Top);
        let sites = finder.find_sites(&square_surface(5.0));
        assert_eq!(sites.len(), 1);
        for (i, a) in sites.iter().enumerate() {
            for b in &sites[i + 1..] {
                assert!((a.position - b.position).norm() >= 1.0);
            }
        }
    }

    #[test]
    fn normals_point_outward_on_either_side() {
        for side in [SurfaceSide::Top, SurfaceSide::Bottom] {
            let finder = HollowSiteFinder::new(2, 0.5, SurfaceAxis::Z, side);
            let outward = SurfaceAxis::Z.outward(side);
            for site in finder.find_sites(&square_surface(5.0)) {
                assert!(site.normal.dot(&outward) >= 0.0);
                assert!((site.normal.norm() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn tilted_cluster_normal_is_flipped_outward() {
        let finder = HollowSiteFinder::new(2, 0.1, SurfaceAxis::Z, SurfaceSide::Top);
        let cluster = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.5),
        ];
        let normal = finder.cluster_normal(&cluster, &Vector3::z());
        assert!(normal.z > 0.0);
        assert!(normal.x.abs() > 0.1);
    }

    #[test]
    fn single_neighbor_uses_axis_normal() {
        let finder = HollowSiteFinder::new(1, 0.1, SurfaceAxis::Z, SurfaceSide::Top);
        let sites = finder.find_sites(&square_surface(5.0));
        assert!(!sites.is_empty());
        assert!(sites.iter().all(|s| s.normal == Vector3::z()));
    }

    #[test]
    fn too_few_surface_atoms_yield_no_sites() {
        let finder = HollowSiteFinder::new(4, 0.5, SurfaceAxis::Z, SurfaceSide::Top);
        assert!(finder.find_sites(&square_surface(5.0)).is_empty());
    }
}
