//! Data models for periodic atomic structures and adsorption geometry.
//!
//! Structures are value types: translating, rotating, extending or padding a structure
//! always yields a new instance, so trial geometries never alias each other's positions.

pub mod elements;
pub mod site;
pub mod slab;
pub mod structure;
