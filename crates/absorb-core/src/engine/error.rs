use super::config::ConfigError;
use crate::core::io::artifacts::ArtifactError;
use crate::core::io::cif::CifError;
use crate::core::oracle::OracleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid input: {message}")]
    Input {
        message: String,
        #[source]
        source: Option<CifError>,
    },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Energy evaluation failed: {source}")]
    Oracle {
        #[from]
        source: OracleError,
    },

    #[error("Adsorbate collides with the slab: separation {separation:.3} Å is below {threshold:.3} Å")]
    CollisionRejected { separation: f64, threshold: f64 },

    #[error("Orientation optimization did not converge: {0}")]
    ConvergenceFailure(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write results: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Failed to write structure '{path}': {source}")]
    StructureWrite {
        path: String,
        #[source]
        source: CifError,
    },
}

impl EngineError {
    pub fn structure_load(role: &str, path: &str, source: CifError) -> Self {
        EngineError::Input {
            message: format!("failed to load {role} structure from '{path}'"),
            source: Some(source),
        }
    }
}
