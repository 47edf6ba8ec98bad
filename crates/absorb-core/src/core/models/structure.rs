use super::elements::atomic_mass_or_fallback;
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use std::ops::Range;

const DEGENERATE_LENGTH: f64 = 1e-10;

/// A single atom of a periodic structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Chemical symbol or placeholder label (e.g. "Pt", "O", "A").
    pub species: String,
    /// Cartesian position in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(species: &str, position: Point3<f64>) -> Self {
        Self {
            species: species.to_string(),
            position,
        }
    }

    pub fn mass(&self) -> f64 {
        atomic_mass_or_fallback(&self.species)
    }
}

/// An ordered collection of atoms with a periodic cell.
///
/// The cell stores lattice vectors as columns. Periodicity is tracked per axis; an axis
/// flagged non-periodic is never wrapped by minimum-image distance calculations.
///
/// All transformations return a new structure, leaving `self` untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicStructure {
    atoms: Vec<Atom>,
    cell: Matrix3<f64>,
    pbc: [bool; 3],
}

impl AtomicStructure {
    pub fn new(atoms: Vec<Atom>, cell: Matrix3<f64>, pbc: [bool; 3]) -> Self {
        Self { atoms, cell, pbc }
    }

    /// Creates an isolated molecule: zero cell, no periodicity.
    pub fn molecule(atoms: Vec<Atom>) -> Self {
        Self::new(atoms, Matrix3::zeros(), [false; 3])
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn cell(&self) -> &Matrix3<f64> {
        &self.cell
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }

    pub fn lattice_vector(&self, axis: usize) -> Vector3<f64> {
        self.cell.column(axis).into_owned()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Point3<f64>> + '_ {
        self.atoms.iter().map(|a| &a.position)
    }

    pub fn has_finite_positions(&self) -> bool {
        self.positions().all(|p| p.iter().all(|c| c.is_finite()))
    }

    /// Mass-weighted center of the structure, or `None` when it has no atoms.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        if self.atoms.is_empty() {
            return None;
        }
        let (weighted, total) = self.atoms.iter().fold(
            (Vector3::zeros(), 0.0),
            |(acc, mass_sum), atom| {
                let mass = atom.mass();
                (acc + atom.position.coords * mass, mass_sum + mass)
            },
        );
        Some(Point3::from(weighted / total))
    }

    pub fn translated(&self, offset: &Vector3<f64>) -> Self {
        let atoms = self
            .atoms
            .iter()
            .map(|a| Atom::new(&a.species, a.position + offset))
            .collect();
        Self::new(atoms, self.cell, self.pbc)
    }

    /// Rotates only the atoms in `range` about `center`; atoms outside the range keep their
    /// positions.
    pub fn rotated_range(
        &self,
        range: Range<usize>,
        rotation: &Rotation3<f64>,
        center: &Point3<f64>,
    ) -> Self {
        let atoms = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if range.contains(&i) {
                    Atom::new(&a.species, center + rotation * (a.position - center))
                } else {
                    a.clone()
                }
            })
            .collect();
        Self::new(atoms, self.cell, self.pbc)
    }

    /// Appends the atoms of `other`, keeping this structure's cell and periodicity.
    pub fn extended(&self, other: &AtomicStructure) -> Self {
        let mut atoms = Vec::with_capacity(self.atoms.len() + other.atoms.len());
        atoms.extend_from_slice(&self.atoms);
        atoms.extend_from_slice(&other.atoms);
        Self::new(atoms, self.cell, self.pbc)
    }

    /// Copies the atoms in `range` into a new structure sharing this cell and periodicity.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let atoms = self.atoms.get(range).map(<[Atom]>::to_vec).unwrap_or_default();
        Self::new(atoms, self.cell, self.pbc)
    }

    pub fn with_pbc(&self, pbc: [bool; 3]) -> Self {
        Self::new(self.atoms.clone(), self.cell, pbc)
    }

    pub fn with_cell(&self, cell: Matrix3<f64>) -> Self {
        Self::new(self.atoms.clone(), cell, self.pbc)
    }

    /// Pads the cell along `axis` with `vacuum` Angstroms on each side of the atoms.
    ///
    /// The cell height along `axis` (measured normal to the plane of the other two lattice
    /// vectors) becomes the atomic extent plus twice the vacuum, and atoms are shifted along
    /// the `axis` lattice vector so that the lowest atom sits `vacuum` above the cell origin.
    pub fn with_vacuum(&self, axis: usize, vacuum: f64) -> Self {
        if self.atoms.is_empty() {
            return self.clone();
        }
        let (o1, o2) = match axis {
            0 => (1, 2),
            1 => (2, 0),
            _ => (0, 1),
        };
        let column = self.lattice_vector(axis);
        let mut normal = self.lattice_vector(o1).cross(&self.lattice_vector(o2));
        normal = if normal.norm() < DEGENERATE_LENGTH {
            let mut unit = Vector3::zeros();
            unit[axis] = 1.0;
            unit
        } else {
            normal.normalize()
        };
        if column.dot(&normal) < 0.0 {
            normal = -normal;
        }

        let heights: Vec<f64> = self.positions().map(|p| p.coords.dot(&normal)).collect();
        let lowest = heights.iter().copied().fold(f64::INFINITY, f64::min);
        let highest = heights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let new_height = highest - lowest + 2.0 * vacuum;

        let height = column.dot(&normal);
        let new_column = if height < DEGENERATE_LENGTH {
            normal * new_height
        } else {
            column * (new_height / height)
        };

        let step = new_column.dot(&normal);
        let shift = new_column * ((vacuum - lowest) / step);

        let mut cell = self.cell;
        cell.set_column(axis, &new_column);
        self.translated(&shift).with_cell(cell)
    }

    /// Displacement from `from` to `to` under the minimum-image convention on periodic axes.
    ///
    /// Fractional components are wrapped into `[-0.5, 0.5]` first; the neighboring images are
    /// then searched so skewed cells still yield the true shortest vector.
    pub fn minimum_image_vector(&self, from: &Point3<f64>, to: &Point3<f64>) -> Vector3<f64> {
        let direct = to - from;
        if !self.is_periodic() {
            return direct;
        }
        let Some(inverse) = self.cell.try_inverse() else {
            return direct;
        };

        let mut fractional = inverse * direct;
        for axis in 0..3 {
            if self.pbc[axis] {
                fractional[axis] -= fractional[axis].round();
            }
        }
        let wrapped = self.cell * fractional;

        let images = |axis: usize| if self.pbc[axis] { -1..=1 } else { 0..=0 };
        let mut best = wrapped;
        for i in images(0) {
            for j in images(1) {
                for k in images(2) {
                    let candidate =
                        wrapped + self.cell * Vector3::new(i as f64, j as f64, k as f64);
                    if candidate.norm_squared() < best.norm_squared() {
                        best = candidate;
                    }
                }
            }
        }
        best
    }

    pub fn minimum_image_distance(&self, from: &Point3<f64>, to: &Point3<f64>) -> f64 {
        self.minimum_image_vector(from, to).norm()
    }
}
