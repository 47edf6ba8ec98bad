use super::structure::AtomicStructure;
use nalgebra::{Point2, Point3, Rotation3, Vector3};
use std::fmt;
use std::ops::Range;

/// Cartesian axis normal to the exposed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceAxis {
    X,
    Y,
    #[default]
    Z,
}

impl SurfaceAxis {
    pub fn index(self) -> usize {
        match self {
            SurfaceAxis::X => 0,
            SurfaceAxis::Y => 1,
            SurfaceAxis::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SurfaceAxis::X),
            1 => Some(SurfaceAxis::Y),
            2 => Some(SurfaceAxis::Z),
            _ => None,
        }
    }

    /// The two axes spanning the surface plane, in ascending order.
    pub fn in_plane(self) -> [usize; 2] {
        match self {
            SurfaceAxis::X => [1, 2],
            SurfaceAxis::Y => [0, 2],
            SurfaceAxis::Z => [0, 1],
        }
    }

    /// Drops the surface-axis component of `point`.
    pub fn project(self, point: &Point3<f64>) -> Point2<f64> {
        let [a, b] = self.in_plane();
        Point2::new(point[a], point[b])
    }

    /// Unit vector pointing away from the bulk on the given side.
    pub fn outward(self, side: SurfaceSide) -> Vector3<f64> {
        let mut v = Vector3::zeros();
        v[self.index()] = match side {
            SurfaceSide::Top => 1.0,
            SurfaceSide::Bottom => -1.0,
        };
        v
    }
}

impl TryFrom<usize> for SurfaceAxis {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::from_index(value).ok_or(value)
    }
}

impl fmt::Display for SurfaceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Which face of the slab receives the adsorbate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceSide {
    #[default]
    Top,
    Bottom,
}

impl SurfaceSide {
    pub fn from_bottom_flag(place_on_bottom: bool) -> Self {
        if place_on_bottom {
            SurfaceSide::Bottom
        } else {
            SurfaceSide::Top
        }
    }
}

/// A substrate padded with vacuum along the surface axis, non-periodic along that axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    structure: AtomicStructure,
    axis: SurfaceAxis,
}

impl Slab {
    pub fn build(substrate: &AtomicStructure, axis: SurfaceAxis, vacuum: f64) -> Self {
        let mut pbc = [true; 3];
        pbc[axis.index()] = false;
        let structure = substrate.with_vacuum(axis.index(), vacuum).with_pbc(pbc);
        Self { structure, axis }
    }

    pub fn structure(&self) -> &AtomicStructure {
        &self.structure
    }

    pub fn axis(&self) -> SurfaceAxis {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.structure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    /// Places a copy of `adsorbate` with its center of mass at `target`.
    ///
    /// Returns `None` for an empty adsorbate.
    pub fn place(&self, adsorbate: &AtomicStructure, target: &Point3<f64>) -> Option<PlacedSystem> {
        let com = adsorbate.center_of_mass()?;
        let moved = adsorbate.translated(&(target - com));
        Some(PlacedSystem::new(&self.structure, &moved))
    }
}

/// A slab plus an adsorbate copy, with the partition boundary between them.
///
/// Atoms `0..slab_atom_count` belong to the slab and are fixed; the remaining atoms belong to
/// the adsorbate and are the only ones rotated.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSystem {
    system: AtomicStructure,
    slab_atom_count: usize,
}

impl PlacedSystem {
    pub fn new(slab: &AtomicStructure, adsorbate: &AtomicStructure) -> Self {
        Self {
            system: slab.extended(adsorbate),
            slab_atom_count: slab.len(),
        }
    }

    pub fn system(&self) -> &AtomicStructure {
        &self.system
    }

    pub fn slab_atom_count(&self) -> usize {
        self.slab_atom_count
    }

    pub fn adsorbate_atom_count(&self) -> usize {
        self.system.len() - self.slab_atom_count
    }

    pub fn slab_indices(&self) -> Range<usize> {
        0..self.slab_atom_count
    }

    pub fn adsorbate_indices(&self) -> Range<usize> {
        self.slab_atom_count..self.system.len()
    }

    pub fn adsorbate(&self) -> AtomicStructure {
        self.system.slice(self.adsorbate_indices())
    }

    pub fn adsorbate_center_of_mass(&self) -> Option<Point3<f64>> {
        self.adsorbate().center_of_mass()
    }

    /// Rotates only the adsorbate atoms about `center`.
    pub fn with_adsorbate_rotated(&self, rotation: &Rotation3<f64>, center: &Point3<f64>) -> Self {
        Self {
            system: self
                .system
                .rotated_range(self.adsorbate_indices(), rotation, center),
            slab_atom_count: self.slab_atom_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::Atom;
    use nalgebra::Matrix3;

    fn two_atom_slab() -> AtomicStructure {
        AtomicStructure::new(
            vec![
                Atom::new("A", Point3::new(0.0, 0.0, 0.0)),
                Atom::new("A", Point3::new(1.0, 1.0, 2.0)),
            ],
            Matrix3::identity() * 4.0,
            [true; 3],
        )
    }

    #[test]
    fn slab_disables_periodicity_on_surface_axis_only() {
        let slab = Slab::build(&two_atom_slab(), SurfaceAxis::Y, 10.0);
        assert_eq!(slab.structure().pbc(), [true, false, true]);
    }

    #[test]
    fn outward_vector_flips_for_bottom_side() {
        assert_eq!(
            SurfaceAxis::Z.outward(SurfaceSide::Bottom),
            Vector3::new(0.0, 0.0, -1.0)
        );
        assert_eq!(
            SurfaceAxis::X.outward(SurfaceSide::Top),
            Vector3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn placed_system_tracks_partition_boundary() {
        let slab = Slab::build(&two_atom_slab(), SurfaceAxis::Z, 10.0);
        let adsorbate = AtomicStructure::molecule(vec![
            Atom::new("B", Point3::new(0.0, 0.0, 0.0)),
            Atom::new("C", Point3::new(1.0, 0.0, 0.0)),
        ]);
        let placed = slab.place(&adsorbate, &Point3::new(2.0, 2.0, 15.0)).unwrap();

        assert_eq!(placed.slab_atom_count(), 2);
        assert_eq!(placed.adsorbate_indices(), 2..4);
        assert_eq!(placed.slab_indices(), 0..2);

        let com = placed.adsorbate_center_of_mass().unwrap();
        assert!((com - Point3::new(2.0, 2.0, 15.0)).norm() < 1e-9);
    }

    #[test]
    fn rotating_adsorbate_keeps_slab_atoms_fixed() {
        let slab = Slab::build(&two_atom_slab(), SurfaceAxis::Z, 10.0);
        let adsorbate = AtomicStructure::molecule(vec![
            Atom::new("B", Point3::new(0.0, 0.0, 0.0)),
            Atom::new("B", Point3::new(1.0, 0.0, 0.0)),
        ]);
        let placed = slab.place(&adsorbate, &Point3::new(2.0, 2.0, 15.0)).unwrap();
        let center = placed.adsorbate_center_of_mass().unwrap();
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), 90f64.to_radians());
        let rotated = placed.with_adsorbate_rotated(&rotation, &center);

        for i in placed.slab_indices() {
            assert_eq!(
                rotated.system().atoms()[i].position,
                placed.system().atoms()[i].position
            );
        }
        let moved = rotated.system().atoms()[2].position;
        assert!((moved - Point3::new(2.0, 1.5, 15.0)).norm() < 1e-9);
    }

    #[test]
    fn placing_empty_adsorbate_is_rejected() {
        let slab = Slab::build(&two_atom_slab(), SurfaceAxis::Z, 10.0);
        assert!(slab
            .place(&AtomicStructure::molecule(Vec::new()), &Point3::origin())
            .is_none());
    }
}
