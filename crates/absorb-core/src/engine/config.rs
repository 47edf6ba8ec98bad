use crate::core::models::slab::{SurfaceAxis, SurfaceSide};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: String,
    },
}

fn check_range<T>(name: &'static str, value: T, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            value: value.to_string(),
            expected: format!("a value between {} and {}", range.start(), range.end()),
        })
    }
}

pub const ADSORPTION_HEIGHT_RANGE: RangeInclusive<f64> = 0.1..=10.0;
pub const VACUUM_RANGE: RangeInclusive<f64> = 5.0..=50.0;
pub const SEARCH_DEPTH_RANGE: RangeInclusive<f64> = 0.5..=10.0;
pub const COLLISION_THRESHOLD_RANGE: RangeInclusive<f64> = 0.5..=3.0;
pub const KNN_NEIGHBORS_RANGE: RangeInclusive<usize> = 1..=10;
pub const DEDUPLICATION_DISTANCE_RANGE: RangeInclusive<f64> = 0.1..=5.0;
pub const ROTATION_COUNT_RANGE: RangeInclusive<usize> = 10..=200;
pub const ROTATION_STEP_RANGE: RangeInclusive<f64> = 1.0..=90.0;

/// Orientation search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationMethod {
    /// Continuous search of the rotation angle about the site normal.
    #[default]
    Normal,
    /// Exhaustive sampling of Fibonacci-sphere axes and discrete angles.
    Sphere,
}

impl RotationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RotationMethod::Normal => "normal",
            RotationMethod::Sphere => "sphere",
        }
    }

    /// Legacy boolean encoding: `true` selects sphere sampling.
    pub fn from_legacy_flag(use_sphere: bool) -> Self {
        if use_sphere {
            RotationMethod::Sphere
        } else {
            RotationMethod::Normal
        }
    }
}

impl fmt::Display for RotationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(RotationMethod::Normal),
            "sphere" => Ok(RotationMethod::Sphere),
            "true" => Ok(RotationMethod::from_legacy_flag(true)),
            "false" => Ok(RotationMethod::from_legacy_flag(false)),
            _ => Err(ConfigError::InvalidParameter {
                name: "rotation_method",
                value: s.to_string(),
                expected: "'normal' or 'sphere'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    /// Green for low (favorable) energy through yellow to red for high energy.
    #[default]
    GreenYellowRed,
    /// Black through red and yellow to white.
    Hot,
    /// Cyan to magenta.
    Cool,
}

impl ColorScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::GreenYellowRed => "default",
            ColorScheme::Hot => "hot",
            ColorScheme::Cool => "cool",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "green-yellow-red" => Ok(ColorScheme::GreenYellowRed),
            "hot" => Ok(ColorScheme::Hot),
            "cool" => Ok(ColorScheme::Cool),
            _ => Err(ConfigError::InvalidParameter {
                name: "color_scheme",
                value: s.to_string(),
                expected: "'default', 'hot' or 'cool'".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    pub surface_axis: SurfaceAxis,
    pub side: SurfaceSide,
    /// Distance of the adsorbate center of mass above the site, along the site normal.
    pub adsorption_height: f64,
    pub vacuum: f64,
    /// Atoms within this distance of the outermost layer count as surface atoms.
    pub surface_search_depth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteSearchConfig {
    pub find_hollow_sites: bool,
    pub knn_neighbors: usize,
    pub hollow_deduplication_distance: f64,
    pub find_on_top_sites: bool,
    pub on_top_target_species: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationConfig {
    pub method: RotationMethod,
    /// Number of Fibonacci-sphere axes (sphere strategy).
    pub count: usize,
    /// Angle increment in degrees (sphere strategy).
    pub step_degrees: f64,
    /// Iteration cap for the scalar minimizer (normal strategy).
    pub max_iterations: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdsorptionConfig {
    pub placement: PlacementConfig,
    pub sites: SiteSearchConfig,
    pub rotation: RotationConfig,
    pub collision_threshold: f64,
    /// Process sites on the rayon pool when the `parallel` feature is compiled in.
    pub parallel_sites: bool,
}

pub const DEFAULT_SURFACE_AXIS: usize = 2;
pub const DEFAULT_ADSORPTION_HEIGHT: f64 = 2.0;
pub const DEFAULT_VACUUM: f64 = 20.0;
pub const DEFAULT_SURFACE_SEARCH_DEPTH: f64 = 3.5;
pub const DEFAULT_COLLISION_THRESHOLD: f64 = 1.2;
pub const DEFAULT_KNN_NEIGHBORS: usize = 2;
pub const DEFAULT_DEDUPLICATION_DISTANCE: f64 = 1.5;
pub const DEFAULT_ON_TOP_TARGET: &str = "O";
pub const DEFAULT_ROTATION_COUNT: usize = 50;
pub const DEFAULT_ROTATION_STEP: f64 = 30.0;
pub const DEFAULT_MAX_ITERATIONS: u64 = 500;

#[derive(Default)]
pub struct AdsorptionConfigBuilder {
    surface_axis: Option<usize>,
    place_on_bottom: Option<bool>,
    adsorption_height: Option<f64>,
    vacuum: Option<f64>,
    surface_search_depth: Option<f64>,
    collision_threshold: Option<f64>,
    find_hollow_sites: Option<bool>,
    knn_neighbors: Option<usize>,
    hollow_deduplication_distance: Option<f64>,
    find_on_top_sites: Option<bool>,
    on_top_target_species: Option<String>,
    rotation_method: Option<RotationMethod>,
    rotation_count: Option<usize>,
    rotation_step: Option<f64>,
    max_iterations: Option<u64>,
    parallel_sites: Option<bool>,
}

impl AdsorptionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-filled with the standard defaults.
    pub fn with_defaults() -> Self {
        Self::new()
            .surface_axis(DEFAULT_SURFACE_AXIS)
            .place_on_bottom(false)
            .adsorption_height(DEFAULT_ADSORPTION_HEIGHT)
            .vacuum(DEFAULT_VACUUM)
            .surface_search_depth(DEFAULT_SURFACE_SEARCH_DEPTH)
            .collision_threshold(DEFAULT_COLLISION_THRESHOLD)
            .find_hollow_sites(true)
            .knn_neighbors(DEFAULT_KNN_NEIGHBORS)
            .hollow_deduplication_distance(DEFAULT_DEDUPLICATION_DISTANCE)
            .find_on_top_sites(true)
            .on_top_target_species(DEFAULT_ON_TOP_TARGET)
            .rotation_method(RotationMethod::Normal)
            .rotation_count(DEFAULT_ROTATION_COUNT)
            .rotation_step(DEFAULT_ROTATION_STEP)
            .max_iterations(DEFAULT_MAX_ITERATIONS)
            .parallel_sites(false)
    }

    pub fn surface_axis(mut self, axis: usize) -> Self {
        self.surface_axis = Some(axis);
        self
    }
    pub fn place_on_bottom(mut self, bottom: bool) -> Self {
        self.place_on_bottom = Some(bottom);
        self
    }
    pub fn adsorption_height(mut self, height: f64) -> Self {
        self.adsorption_height = Some(height);
        self
    }
    pub fn vacuum(mut self, vacuum: f64) -> Self {
        self.vacuum = Some(vacuum);
        self
    }
    pub fn surface_search_depth(mut self, depth: f64) -> Self {
        self.surface_search_depth = Some(depth);
        self
    }
    pub fn collision_threshold(mut self, threshold: f64) -> Self {
        self.collision_threshold = Some(threshold);
        self
    }
    pub fn find_hollow_sites(mut self, enabled: bool) -> Self {
        self.find_hollow_sites = Some(enabled);
        self
    }
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }
    pub fn hollow_deduplication_distance(mut self, distance: f64) -> Self {
        self.hollow_deduplication_distance = Some(distance);
        self
    }
    pub fn find_on_top_sites(mut self, enabled: bool) -> Self {
        self.find_on_top_sites = Some(enabled);
        self
    }
    pub fn on_top_target_species(mut self, species: &str) -> Self {
        self.on_top_target_species = Some(species.to_string());
        self
    }
    pub fn rotation_method(mut self, method: RotationMethod) -> Self {
        self.rotation_method = Some(method);
        self
    }
    pub fn rotation_count(mut self, count: usize) -> Self {
        self.rotation_count = Some(count);
        self
    }
    pub fn rotation_step(mut self, step_degrees: f64) -> Self {
        self.rotation_step = Some(step_degrees);
        self
    }
    pub fn max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn parallel_sites(mut self, enabled: bool) -> Self {
        self.parallel_sites = Some(enabled);
        self
    }

    pub fn build(self) -> Result<AdsorptionConfig, ConfigError> {
        let axis_index = self
            .surface_axis
            .ok_or(ConfigError::MissingParameter("surface_axis"))?;
        let surface_axis = SurfaceAxis::from_index(axis_index).ok_or_else(|| {
            ConfigError::InvalidParameter {
                name: "surface_axis",
                value: axis_index.to_string(),
                expected: "0, 1 or 2".to_string(),
            }
        })?;

        let placement = PlacementConfig {
            surface_axis,
            side: SurfaceSide::from_bottom_flag(
                self.place_on_bottom
                    .ok_or(ConfigError::MissingParameter("place_on_bottom"))?,
            ),
            adsorption_height: check_range(
                "adsorption_height",
                self.adsorption_height
                    .ok_or(ConfigError::MissingParameter("adsorption_height"))?,
                ADSORPTION_HEIGHT_RANGE,
            )?,
            vacuum: check_range(
                "vacuum",
                self.vacuum.ok_or(ConfigError::MissingParameter("vacuum"))?,
                VACUUM_RANGE,
            )?,
            surface_search_depth: check_range(
                "surface_search_depth",
                self.surface_search_depth
                    .ok_or(ConfigError::MissingParameter("surface_search_depth"))?,
                SEARCH_DEPTH_RANGE,
            )?,
        };

        let sites = SiteSearchConfig {
            find_hollow_sites: self
                .find_hollow_sites
                .ok_or(ConfigError::MissingParameter("find_hollow_sites"))?,
            knn_neighbors: check_range(
                "knn_neighbors",
                self.knn_neighbors
                    .ok_or(ConfigError::MissingParameter("knn_neighbors"))?,
                KNN_NEIGHBORS_RANGE,
            )?,
            hollow_deduplication_distance: check_range(
                "hollow_deduplication_distance",
                self.hollow_deduplication_distance
                    .ok_or(ConfigError::MissingParameter("hollow_deduplication_distance"))?,
                DEDUPLICATION_DISTANCE_RANGE,
            )?,
            find_on_top_sites: self
                .find_on_top_sites
                .ok_or(ConfigError::MissingParameter("find_on_top_sites"))?,
            on_top_target_species: self
                .on_top_target_species
                .ok_or(ConfigError::MissingParameter("on_top_target_species"))?,
        };
        if sites.find_on_top_sites && sites.on_top_target_species.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "on_top_target_species",
                value: String::new(),
                expected: "a non-empty species symbol".to_string(),
            });
        }

        let rotation = RotationConfig {
            method: self
                .rotation_method
                .ok_or(ConfigError::MissingParameter("rotation_method"))?,
            count: check_range(
                "rotation_count",
                self.rotation_count
                    .ok_or(ConfigError::MissingParameter("rotation_count"))?,
                ROTATION_COUNT_RANGE,
            )?,
            step_degrees: check_range(
                "rotation_step",
                self.rotation_step
                    .ok_or(ConfigError::MissingParameter("rotation_step"))?,
                ROTATION_STEP_RANGE,
            )?,
            max_iterations: self
                .max_iterations
                .ok_or(ConfigError::MissingParameter("max_iterations"))?,
        };

        Ok(AdsorptionConfig {
            placement,
            sites,
            rotation,
            collision_threshold: check_range(
                "collision_threshold",
                self.collision_threshold
                    .ok_or(ConfigError::MissingParameter("collision_threshold"))?,
                COLLISION_THRESHOLD_RANGE,
            )?,
            parallel_sites: self
                .parallel_sites
                .ok_or(ConfigError::MissingParameter("parallel_sites"))?,
        })
    }
}

pub const DEFAULT_MAX_EDGE_LENGTH: f64 = 10.0;
pub const DEFAULT_SMOOTH_ITERATIONS: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    pub surface_axis: SurfaceAxis,
    /// Triangles whose longest 3D edge exceeds this are dropped; `None` keeps all.
    pub max_edge_length: Option<f64>,
    pub smooth_iterations: usize,
    pub color_scheme: ColorScheme,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            surface_axis: SurfaceAxis::default(),
            max_edge_length: Some(DEFAULT_MAX_EDGE_LENGTH),
            smooth_iterations: DEFAULT_SMOOTH_ITERATIONS,
            color_scheme: ColorScheme::default(),
        }
    }
}

impl MeshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.max_edge_length {
            Some(length) if !(length.is_finite() && length > 0.0) => {
                Err(ConfigError::InvalidParameter {
                    name: "max_edge_length",
                    value: length.to_string(),
                    expected: "a positive length".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}
