//! # Engine Module
//!
//! The algorithmic layer of ABSORB: everything between a loaded structure and a ranked list
//! of adsorption configurations, plus the surface energy mesh derived from those results.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated run and mesh parameters with builders
//! - **Surface Selection** ([`surface`]) - Extraction of the exposed atomic layer
//! - **Site Discovery** ([`sites`]) - Hollow and on-top site finders behind [`sites::SiteFinder`]
//! - **Orientation Search** ([`rotation`]) - Surrogate-driven rotation optimization strategies
//! - **Collision Filtering** ([`collision`]) - Periodic-image-aware adsorbate/slab separation
//! - **Mesh Construction** ([`mesh`]) - Triangulation, interpolation, and colored mesh assembly
//! - **Run State** ([`state`]) - Per-site results, skipped-site records, and the run report
//! - **Progress & Cancellation** ([`progress`], [`cancel`]) - Caller feedback and cooperative stop
//! - **Error Handling** ([`error`]) - The engine error taxonomy
//!
//! Every component here is a pure function over its inputs or a strategy object fixed at
//! construction; the workflows in [`crate::workflows`] wire them together.

pub mod cancel;
pub mod collision;
pub mod config;
pub mod error;
pub mod mesh;
pub mod progress;
pub mod rotation;
pub mod sites;
pub mod state;
pub mod surface;
