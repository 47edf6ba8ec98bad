use super::SiteFinder;
use crate::core::models::site::{AdsorptionSite, SiteType};
use crate::core::models::slab::{SurfaceAxis, SurfaceSide};
use crate::engine::surface::SurfaceAtoms;
use tracing::info;

/// One site directly on each surface atom of the target species.
#[derive(Debug, Clone, PartialEq)]
pub struct OnTopSiteFinder {
    target_species: String,
    axis: SurfaceAxis,
    side: SurfaceSide,
}

impl OnTopSiteFinder {
    pub fn new(target_species: &str, axis: SurfaceAxis, side: SurfaceSide) -> Self {
        Self {
            target_species: target_species.to_string(),
            axis,
            side,
        }
    }
}

impl SiteFinder for OnTopSiteFinder {
    fn site_type(&self) -> SiteType {
        SiteType::OnTop
    }

    fn find_sites(&self, surface: &SurfaceAtoms) -> Vec<AdsorptionSite> {
        let normal = self.axis.outward(self.side);
        let sites: Vec<AdsorptionSite> = surface
            .species
            .iter()
            .zip(&surface.positions)
            .filter(|(species, _)| **species == self.target_species)
            .map(|(_, position)| AdsorptionSite::new(*position, normal, SiteType::OnTop))
            .collect();
        info!(
            target = %self.target_species,
            count = sites.len(),
            "Found on-top sites."
        );
        sites
    }
}
