use nalgebra::{Point3, Vector3};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteType {
    /// Centroid of a cluster of neighboring surface atoms.
    Hollow,
    /// Directly above a surface atom of the target species.
    OnTop,
}

impl SiteType {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteType::Hollow => "Hollow",
            SiteType::OnTop => "On-Top",
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSiteTypeError(pub String);

impl fmt::Display for ParseSiteTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown site type '{}'", self.0)
    }
}

impl std::error::Error for ParseSiteTypeError {}

impl FromStr for SiteType {
    type Err = ParseSiteTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "hollow" => Ok(SiteType::Hollow),
            "ontop" => Ok(SiteType::OnTop),
            _ => Err(ParseSiteTypeError(s.to_string())),
        }
    }
}

/// A candidate adsorption position with its outward unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct AdsorptionSite {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
    pub site_type: SiteType,
}

impl AdsorptionSite {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>, site_type: SiteType) -> Self {
        Self {
            position,
            normal,
            site_type,
        }
    }

    /// Point `height` Angstroms above the site along its normal.
    pub fn target_position(&self, height: f64) -> Point3<f64> {
        self.position + self.normal * height
    }
}
