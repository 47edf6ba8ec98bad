//! Candidate adsorption site discovery.
//!
//! Finders are strategies behind [`SiteFinder`]; the orchestrator runs the enabled ones and
//! concatenates their output, hollow sites first.

pub mod hollow;
pub mod ontop;

use super::surface::SurfaceAtoms;
use crate::core::models::site::{AdsorptionSite, SiteType};

pub use hollow::HollowSiteFinder;
pub use ontop::OnTopSiteFinder;

pub trait SiteFinder: Send + Sync {
    fn site_type(&self) -> SiteType;

    /// Returns candidate sites whose normals point away from the bulk.
    fn find_sites(&self, surface: &SurfaceAtoms) -> Vec<AdsorptionSite>;
}
