//! Energy evaluation.
//!
//! The rest of the library treats energy as a black box behind [`EnergyOracle`]. Two reference
//! pair potentials ship with the crate so the pipeline runs end to end without an external
//! calculator; [`registry::OracleRegistry`] maps names to constructors for them.

pub mod pairwise;
pub mod potentials;
pub mod registry;

use crate::core::models::structure::AtomicStructure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Cannot evaluate the energy of an empty structure")]
    EmptyStructure,

    #[error("Structure contains non-finite coordinates")]
    NonFiniteCoordinates,

    #[error("Oracle '{oracle}' produced a non-finite energy ({energy})")]
    NonFiniteEnergy { oracle: String, energy: f64 },

    #[error("Unknown energy oracle '{name}' (available: {available})")]
    UnknownOracle { name: String, available: String },

    #[error("Invalid parameter for oracle '{oracle}': {message}")]
    InvalidParameter { oracle: String, message: String },

    #[error("Energy evaluation failed: {0}")]
    Evaluation(String),
}

/// A black-box scalar energy function over atomic arrangements.
///
/// Implementations are shared read-only across sites and threads.
pub trait EnergyOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the energy of `structure` in eV.
    ///
    /// # Errors
    ///
    /// Fails on empty structures, non-finite coordinates, or a non-finite result.
    fn evaluate(&self, structure: &AtomicStructure) -> Result<f64, OracleError>;
}

/// Rejects structures no oracle can meaningfully score.
pub fn validate_structure(structure: &AtomicStructure) -> Result<(), OracleError> {
    if structure.is_empty() {
        return Err(OracleError::EmptyStructure);
    }
    if !structure.has_finite_positions() {
        return Err(OracleError::NonFiniteCoordinates);
    }
    Ok(())
}

pub fn validate_energy(oracle: &str, energy: f64) -> Result<f64, OracleError> {
    if energy.is_finite() {
        Ok(energy)
    } else {
        Err(OracleError::NonFiniteEnergy {
            oracle: oracle.to_string(),
            energy,
        })
    }
}
