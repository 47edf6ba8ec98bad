use super::rotation::OptimizationInfo;
use super::surface::SurfaceAtoms;
use crate::core::models::site::{AdsorptionSite, SiteType};
use crate::core::models::slab::{PlacedSystem, Slab};
use nalgebra::Point3;
use std::cmp::Ordering;
use std::fmt;

/// A scored adsorption configuration at one site.
#[derive(Debug, Clone)]
pub struct SiteResult {
    /// 1-based index of the site in discovery order.
    pub site_index: usize,
    pub site: AdsorptionSite,
    pub optimized_system: PlacedSystem,
    /// `E(slab + adsorbate) - E(slab) - E(adsorbate)` with the final oracle.
    pub adsorption_energy: f64,
    pub min_separation: f64,
    pub optimization_info: OptimizationInfo,
    pub adsorbate_center_of_mass: Point3<f64>,
}

impl SiteResult {
    pub fn slab_atom_count(&self) -> usize {
        self.optimized_system.slab_atom_count()
    }

    fn energy_order(&self, other: &Self) -> Ordering {
        self.adsorption_energy
            .partial_cmp(&other.adsorption_energy)
            .unwrap_or(Ordering::Equal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Collision { separation: f64 },
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Collision { separation } => {
                write!(f, "collision (separation {separation:.3} Å)")
            }
            SkipReason::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSite {
    pub site_index: usize,
    pub site_type: SiteType,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    NoSurfaceAtoms,
    NoSites,
    NoResults,
    Cancelled,
}

impl RunStatus {
    pub fn is_completed(self) -> bool {
        self == RunStatus::Completed
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunStatus::Completed => "completed",
            RunStatus::NoSurfaceAtoms => "no surface atoms found",
            RunStatus::NoSites => "no adsorption sites found",
            RunStatus::NoResults => "no site produced a valid configuration",
            RunStatus::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Everything an adsorption run produced, with `results` ranked by adsorption energy.
#[derive(Debug, Clone)]
pub struct AdsorptionReport {
    pub slab: Slab,
    pub surface_atoms: SurfaceAtoms,
    pub sites: Vec<AdsorptionSite>,
    pub slab_energy: f64,
    pub adsorbate_energy: f64,
    pub results: Vec<SiteResult>,
    pub skipped: Vec<SkippedSite>,
    pub status: RunStatus,
}

impl AdsorptionReport {
    pub(crate) fn new(slab: Slab, slab_energy: f64, adsorbate_energy: f64) -> Self {
        Self {
            slab,
            surface_atoms: SurfaceAtoms::default(),
            sites: Vec::new(),
            slab_energy,
            adsorbate_energy,
            results: Vec::new(),
            skipped: Vec::new(),
            status: RunStatus::Completed,
        }
    }

    pub fn best(&self) -> Option<&SiteResult> {
        self.results.first()
    }

    pub fn collision_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::Collision { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.skipped.len() - self.collision_count()
    }

    /// Stable ascending sort of results by adsorption energy.
    pub(crate) fn rank_results(&mut self) {
        self.results.sort_by(SiteResult::energy_order);
    }
}
