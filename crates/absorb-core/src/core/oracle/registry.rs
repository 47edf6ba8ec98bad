use super::pairwise::{PairPotential, PairPotentialOracle};
use super::{EnergyOracle, OracleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub const LENNARD_JONES: &str = "lennard-jones";
pub const MORSE: &str = "morse";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LennardJonesParams {
    pub sigma: f64,
    pub epsilon: f64,
    /// Defaults to `3σ` when absent.
    pub cutoff: Option<f64>,
}

impl Default for LennardJonesParams {
    fn default() -> Self {
        Self {
            sigma: 2.5,
            epsilon: 0.01,
            cutoff: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MorseParams {
    pub epsilon: f64,
    pub r0: f64,
    pub rho0: f64,
    /// Defaults to `3 r0` when absent.
    pub cutoff: Option<f64>,
}

impl Default for MorseParams {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            r0: 2.5,
            rho0: 6.0,
            cutoff: None,
        }
    }
}

/// Parameters for the built-in oracles, as found under `[oracle.*]` in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OracleParams {
    pub lennard_jones: LennardJonesParams,
    pub morse: MorseParams,
}

impl OracleParams {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn require_positive(oracle: &str, field: &str, value: f64) -> Result<f64, OracleError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(OracleError::InvalidParameter {
            oracle: oracle.to_string(),
            message: format!("{field} must be a positive number, got {value}"),
        })
    }
}

fn build_lennard_jones(params: &OracleParams) -> Result<Arc<dyn EnergyOracle>, OracleError> {
    let p = &params.lennard_jones;
    let sigma = require_positive(LENNARD_JONES, "sigma", p.sigma)?;
    let epsilon = require_positive(LENNARD_JONES, "epsilon", p.epsilon)?;
    let cutoff = require_positive(LENNARD_JONES, "cutoff", p.cutoff.unwrap_or(3.0 * sigma))?;
    Ok(Arc::new(PairPotentialOracle::new(
        LENNARD_JONES,
        PairPotential::LennardJones { sigma, epsilon },
        cutoff,
    )))
}

fn build_morse(params: &OracleParams) -> Result<Arc<dyn EnergyOracle>, OracleError> {
    let p = &params.morse;
    let epsilon = require_positive(MORSE, "epsilon", p.epsilon)?;
    let r0 = require_positive(MORSE, "r0", p.r0)?;
    let rho0 = require_positive(MORSE, "rho0", p.rho0)?;
    let cutoff = require_positive(MORSE, "cutoff", p.cutoff.unwrap_or(3.0 * r0))?;
    Ok(Arc::new(PairPotentialOracle::new(
        MORSE,
        PairPotential::Morse { epsilon, r0, rho0 },
        cutoff,
    )))
}

pub type OracleConstructor =
    Box<dyn Fn(&OracleParams) -> Result<Arc<dyn EnergyOracle>, OracleError> + Send + Sync>;

/// Name-to-constructor map for energy oracles.
///
/// Registries are plain values handed to whoever needs them; there is no global instance.
#[derive(Default)]
pub struct OracleRegistry {
    constructors: BTreeMap<String, OracleConstructor>,
}

impl OracleRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `lennard-jones` and `morse` oracles.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(LENNARD_JONES, Box::new(build_lennard_jones));
        registry.register(MORSE, Box::new(build_morse));
        registry
    }

    /// Registers `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, constructor: OracleConstructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn available(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn create(
        &self,
        name: &str,
        params: &OracleParams,
    ) -> Result<Arc<dyn EnergyOracle>, OracleError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| OracleError::UnknownOracle {
                    name: name.to_string(),
                    available: self.available().join(", "),
                })?;
        constructor(params)
    }
}

impl fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleRegistry")
            .field("oracles", &self.available())
            .finish()
    }
}
