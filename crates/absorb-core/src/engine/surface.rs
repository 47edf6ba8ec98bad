use crate::core::models::slab::{SurfaceAxis, SurfaceSide};
use crate::core::models::structure::AtomicStructure;
use nalgebra::Point3;
use tracing::debug;

/// Atoms of the exposed surface layer, in ascending original index order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceAtoms {
    pub indices: Vec<usize>,
    pub positions: Vec<Point3<f64>>,
    pub species: Vec<String>,
}

impl SurfaceAtoms {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Selects atoms within `search_depth` of the outermost coordinate along `axis`.
///
/// The outermost coordinate is the maximum for the top side and the minimum for the bottom
/// side; the boundary itself is inclusive.
pub fn select_surface_atoms(
    slab: &AtomicStructure,
    axis: SurfaceAxis,
    search_depth: f64,
    side: SurfaceSide,
) -> SurfaceAtoms {
    let a = axis.index();
    let heights: Vec<f64> = slab.positions().map(|p| p[a]).collect();
    if heights.is_empty() {
        return SurfaceAtoms::default();
    }

    let qualifies: Box<dyn Fn(f64) -> bool> = match side {
        SurfaceSide::Top => {
            let level = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Box::new(move |h| h >= level - search_depth)
        }
        SurfaceSide::Bottom => {
            let level = heights.iter().copied().fold(f64::INFINITY, f64::min);
            Box::new(move |h| h <= level + search_depth)
        }
    };

    let mut surface = SurfaceAtoms::default();
    for (index, atom) in slab.atoms().iter().enumerate() {
        if qualifies(heights[index]) {
            surface.indices.push(index);
            surface.positions.push(atom.position);
            surface.species.push(atom.species.clone());
        }
    }
    debug!(count = surface.len(), ?side, "Selected surface atoms.");
    surface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;
    use nalgebra::Matrix3;

    fn layered() -> AtomicStructure {
        let atoms = [0.0, 2.0, 4.0, 4.5]
            .iter()
            .enumerate()
            .map(|(i, &z)| Atom::new(if i % 2 == 0 { "A" } else { "B" }, Point3::new(i as f64, 0.0, z)))
            .collect();
        AtomicStructure::new(atoms, Matrix3::identity() * 10.0, [true, true, false])
    }

    #[test]
    fn top_selection_includes_atoms_within_depth() {
        let surface = select_surface_atoms(&layered(), SurfaceAxis::Z, 1.0, SurfaceSide::Top);
        assert_eq!(surface.indices, vec![2, 3]);
        assert_eq!(surface.species, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn bottom_selection_uses_minimum_coordinate() {
        let surface = select_surface_atoms(&layered(), SurfaceAxis::Z, 2.0, SurfaceSide::Bottom);
        assert_eq!(surface.indices, vec![0, 1]);
    }

    #[test]
    fn boundary_is_inclusive() {
        let surface = select_surface_atoms(&layered(), SurfaceAxis::Z, 2.5, SurfaceSide::Top);
        assert_eq!(surface.indices, vec![1, 2, 3]);
    }

    #[test]
    fn empty_slab_yields_no_surface_atoms() {
        let empty = AtomicStructure::molecule(Vec::new());
        assert!(select_surface_atoms(&empty, SurfaceAxis::Z, 3.5, SurfaceSide::Top).is_empty());
    }
}
