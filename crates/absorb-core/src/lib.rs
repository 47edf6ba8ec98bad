//! # ABSORB Core Library
//!
//! A library for locating energetically favorable adsorption sites of a small molecule on a
//! crystalline surface slab, optimizing the molecule's orientation at each site, and building
//! a triangle mesh of the resulting energy landscape.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`AtomicStructure`, `Slab`,
//!   `PlacedSystem`, `AdsorptionSite`), the energy-oracle capability with reference pair
//!   potentials, structure and artifact I/O, and geometry utilities.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the error taxonomy, progress reporting and
//!   cancellation, plus the algorithms themselves: surface-atom selection, site finders, the
//!   rotation optimizer, the collision checker and the mesh builder.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures tying `engine` and `core`
//!   together: the adsorption orchestrator, the standalone mesh workflow and result export.

pub mod core;
pub mod engine;
pub mod workflows;
