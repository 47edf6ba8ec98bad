//! Reading and writing of structures and run artifacts.
//!
//! Structures go through the [`traits::StructureFile`] interface (CIF is the supported
//! format). The JSON artifacts consumed by the visualization layer and the ranked CSV summary
//! live in [`artifacts`] and [`summary`].

pub mod artifacts;
pub mod cif;
pub mod summary;
pub mod traits;
