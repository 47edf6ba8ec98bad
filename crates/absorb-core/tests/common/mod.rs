#![allow(dead_code)]

use absorb::core::models::structure::{Atom, AtomicStructure};
use absorb::core::oracle::registry::{LENNARD_JONES, MORSE, OracleParams, OracleRegistry};
use absorb::core::oracle::{EnergyOracle, OracleError};
use absorb::engine::cancel::CancellationToken;
use absorb::engine::config::AdsorptionConfigBuilder;
use absorb::workflows::adsorb::OracleSet;
use nalgebra::{Matrix3, Point3};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A square-lattice slab of species "A": `layers` layers of `n × n` atoms, 2 Å apart.
pub fn square_slab(n: usize, layers: usize) -> AtomicStructure {
    let spacing = 2.0;
    let mut atoms = Vec::new();
    for layer in 0..layers {
        for i in 0..n {
            for j in 0..n {
                atoms.push(Atom::new(
                    "A",
                    Point3::new(i as f64 * spacing, j as f64 * spacing, layer as f64 * spacing),
                ));
            }
        }
    }
    let edge = n as f64 * spacing;
    let cell = Matrix3::from_diagonal(&nalgebra::Vector3::new(edge, edge, layers as f64 * spacing));
    AtomicStructure::new(atoms, cell, [true; 3])
}

/// The 8-atom, two-layer slab in a cubic 4 Å cell.
pub fn eight_atom_slab() -> AtomicStructure {
    square_slab(2, 2)
}

pub fn diatomic_adsorbate() -> AtomicStructure {
    AtomicStructure::molecule(vec![
        Atom::new("B", Point3::new(0.0, 0.0, 0.0)),
        Atom::new("C", Point3::new(0.0, 0.0, 1.2)),
    ])
}

/// Hollow-only configuration with a tight surface layer and a permissive collision threshold.
pub fn hollow_only() -> AdsorptionConfigBuilder {
    AdsorptionConfigBuilder::with_defaults()
        .surface_search_depth(1.0)
        .collision_threshold(1.0)
        .find_hollow_sites(true)
        .knn_neighbors(2)
        .find_on_top_sites(false)
}

pub fn default_oracles() -> OracleSet {
    let registry = OracleRegistry::with_defaults();
    let params = OracleParams::default();
    OracleSet {
        scoring: registry.create(MORSE, &params).unwrap(),
        surrogate: registry.create(LENNARD_JONES, &params).unwrap(),
    }
}

/// Wraps an oracle and counts its evaluations.
pub struct CountingOracle {
    inner: Arc<dyn EnergyOracle>,
    calls: AtomicUsize,
}

impl CountingOracle {
    pub fn new(inner: Arc<dyn EnergyOracle>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EnergyOracle for CountingOracle {
    fn name(&self) -> &str {
        "counting"
    }

    fn evaluate(&self, structure: &AtomicStructure) -> Result<f64, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.evaluate(structure)
    }
}

/// Evaluates slab-only and adsorbate-only structures but fails on any slab+adsorbate system.
pub struct CombinedSystemFailingOracle {
    inner: Arc<dyn EnergyOracle>,
}

impl CombinedSystemFailingOracle {
    pub fn new(inner: Arc<dyn EnergyOracle>) -> Self {
        Self { inner }
    }
}

impl EnergyOracle for CombinedSystemFailingOracle {
    fn name(&self) -> &str {
        "combined-failing"
    }

    fn evaluate(&self, structure: &AtomicStructure) -> Result<f64, OracleError> {
        let has = |species: &str| structure.atoms().iter().any(|a| a.species == species);
        if has("A") && has("B") {
            return Err(OracleError::Evaluation(
                "backend rejected the combined system".to_string(),
            ));
        }
        self.inner.evaluate(structure)
    }
}

/// Cancels `token` once `limit` evaluations have completed.
pub struct CancellingOracle {
    inner: Arc<dyn EnergyOracle>,
    token: CancellationToken,
    limit: usize,
    calls: AtomicUsize,
}

impl CancellingOracle {
    pub fn new(inner: Arc<dyn EnergyOracle>, token: CancellationToken, limit: usize) -> Self {
        Self {
            inner,
            token,
            limit,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EnergyOracle for CancellingOracle {
    fn name(&self) -> &str {
        "cancelling"
    }

    fn evaluate(&self, structure: &AtomicStructure) -> Result<f64, OracleError> {
        let energy = self.inner.evaluate(structure);
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
            self.token.cancel();
        }
        energy
    }
}
