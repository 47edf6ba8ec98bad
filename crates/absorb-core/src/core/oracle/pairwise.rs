use super::potentials::{lennard_jones_12_6, morse, shifted_at_cutoff};
use super::{EnergyOracle, OracleError, validate_energy, validate_structure};
use crate::core::models::structure::AtomicStructure;
use nalgebra::Vector3;
use tracing::trace;

const MIN_CELL_VOLUME: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairPotential {
    LennardJones { sigma: f64, epsilon: f64 },
    Morse { epsilon: f64, r0: f64, rho0: f64 },
}

impl PairPotential {
    #[inline]
    pub fn energy(&self, dist: f64) -> f64 {
        match *self {
            PairPotential::LennardJones { sigma, epsilon } => {
                lennard_jones_12_6(dist, sigma, epsilon)
            }
            PairPotential::Morse { epsilon, r0, rho0 } => morse(dist, epsilon, r0, rho0),
        }
    }
}

/// Sums a species-independent pair potential over all atom pairs, including periodic images
/// within the cutoff along periodic axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PairPotentialOracle {
    name: String,
    potential: PairPotential,
    cutoff: f64,
}

impl PairPotentialOracle {
    pub fn new(name: &str, potential: PairPotential, cutoff: f64) -> Self {
        Self {
            name: name.to_string(),
            potential,
            cutoff,
        }
    }

    pub fn potential(&self) -> PairPotential {
        self.potential
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Lattice translations that can bring an image within the cutoff of any atom.
    fn image_translations(&self, structure: &AtomicStructure) -> Vec<Vector3<f64>> {
        let cell = structure.cell();
        let volume = cell.determinant().abs();
        let pbc = structure.pbc();

        let mut repeats = [0i64; 3];
        if volume > MIN_CELL_VOLUME {
            for axis in 0..3 {
                if !pbc[axis] {
                    continue;
                }
                let face = cell
                    .column((axis + 1) % 3)
                    .cross(&cell.column((axis + 2) % 3))
                    .norm();
                let spacing = volume / face;
                repeats[axis] = (self.cutoff / spacing).ceil() as i64;
            }
        }

        let mut translations = Vec::new();
        for i in -repeats[0]..=repeats[0] {
            for j in -repeats[1]..=repeats[1] {
                for k in -repeats[2]..=repeats[2] {
                    translations.push(cell * Vector3::new(i as f64, j as f64, k as f64));
                }
            }
        }
        translations
    }
}

impl EnergyOracle for PairPotentialOracle {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, structure: &AtomicStructure) -> Result<f64, OracleError> {
        validate_structure(structure)?;

        let translations = self.image_translations(structure);
        let atoms = structure.atoms();
        let pair = |dist: f64| shifted_at_cutoff(dist, self.cutoff, |r| self.potential.energy(r));

        let mut energy = 0.0;
        for (i, a) in atoms.iter().enumerate() {
            for (j, b) in atoms.iter().enumerate() {
                for shift in &translations {
                    if i == j && shift.norm_squared() == 0.0 {
                        continue;
                    }
                    let dist = (b.position + *shift - a.position).norm();
                    // Each unordered pair is visited twice.
                    energy += 0.5 * pair(dist);
                }
            }
        }

        trace!(
            oracle = %self.name,
            atoms = atoms.len(),
            images = translations.len(),
            energy,
            "Pair potential evaluated."
        );
        validate_energy(&self.name, energy)
    }
}
