use super::error::EngineError;
use crate::core::models::slab::PlacedSystem;
use crate::core::models::structure::Atom;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rejects placements whose adsorbate comes closer to the slab than a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionChecker {
    threshold: f64,
}

impl CollisionChecker {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Returns the minimum separation when it is at least the threshold.
    pub fn check(&self, placed: &PlacedSystem) -> Result<f64, EngineError> {
        let separation = minimum_separation(placed).unwrap_or(f64::INFINITY);
        if separation < self.threshold {
            return Err(EngineError::CollisionRejected {
                separation,
                threshold: self.threshold,
            });
        }
        Ok(separation)
    }
}

/// Smallest minimum-image distance between any adsorbate atom and any slab atom.
///
/// `None` when either partition is empty.
pub fn minimum_separation(placed: &PlacedSystem) -> Option<f64> {
    let system = placed.system();
    let atoms = system.atoms();
    let slab = &atoms[placed.slab_indices()];
    let adsorbate = &atoms[placed.adsorbate_indices()];
    if slab.is_empty() || adsorbate.is_empty() {
        return None;
    }

    let closest_to_slab = |ads_atom: &Atom| {
        slab.iter()
            .map(|slab_atom| system.minimum_image_distance(&ads_atom.position, &slab_atom.position))
            .fold(f64::INFINITY, f64::min)
    };

    #[cfg(not(feature = "parallel"))]
    let separation = adsorbate
        .iter()
        .map(closest_to_slab)
        .fold(f64::INFINITY, f64::min);

    #[cfg(feature = "parallel")]
    let separation = adsorbate
        .par_iter()
        .map(closest_to_slab)
        .reduce(|| f64::INFINITY, f64::min);

    trace!(separation, "Computed adsorbate-slab separation.");
    Some(separation)
}
