//! # Core Module
//!
//! Fundamental building blocks shared by every other layer of the library.
//!
//! ## Architecture
//!
//! - **Structural Representation** ([`models`]) - Atoms, periodic structures, slabs, placed
//!   adsorbate systems and adsorption sites
//! - **Energy Evaluation** ([`oracle`]) - The `EnergyOracle` capability, reference pair
//!   potentials and the name-to-constructor registry
//! - **File I/O** ([`io`]) - CIF structures, JSON artifacts and the CSV result summary
//! - **Geometry** ([`utils`]) - Rotations, projections, sphere sampling and triangle metrics
//!
//! Everything in this module is free of workflow state: structures are values, and every
//! transformation returns a new instance.

pub mod io;
pub mod models;
pub mod oracle;
pub mod utils;
