//! # Workflows Module
//!
//! High-level entry points that wire the engine components into complete runs.
//!
//! ## Architecture
//!
//! - **Adsorption Workflow** ([`adsorb`]) - Slab construction, site discovery, orientation
//!   optimization, collision filtering, final scoring, and ranking.
//! - **Mesh Workflow** ([`mesh`]) - Surface energy mesh from an in-memory report or from
//!   persisted result files.
//! - **Export** ([`export`]) - Structure, JSON, and CSV artifacts for a finished run.
//!
//! Workflows report progress through [`crate::engine::progress::ProgressReporter`] and honor
//! a shared [`crate::engine::cancel::CancellationToken`].

pub mod adsorb;
pub mod export;
pub mod mesh;
