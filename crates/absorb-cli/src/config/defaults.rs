use absorb::core::oracle::registry::{LENNARD_JONES, MORSE};
use absorb::engine::config as core_config;

pub struct DefaultsConfig {
    pub surface_axis: usize,
    pub place_on_bottom: bool,
    pub adsorption_height: f64,
    pub vacuum: f64,
    pub surface_search_depth: f64,
    pub collision_threshold: f64,
    pub find_hollow_sites: bool,
    pub knn_neighbors: usize,
    pub hollow_deduplication_distance: f64,
    pub find_on_top_sites: bool,
    pub on_top_target_species: String,
    pub rotation_method: core_config::RotationMethod,
    pub rotation_count: usize,
    pub rotation_step: f64,
    pub max_iterations: u64,
    pub scoring_oracle: String,
    pub surrogate_oracle: String,
    pub parallel_sites: bool,
    pub generate_mesh: bool,
    pub max_edge_length: f64,
    pub smooth_iterations: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            surface_axis: core_config::DEFAULT_SURFACE_AXIS,
            place_on_bottom: false,
            adsorption_height: core_config::DEFAULT_ADSORPTION_HEIGHT,
            vacuum: core_config::DEFAULT_VACUUM,
            surface_search_depth: core_config::DEFAULT_SURFACE_SEARCH_DEPTH,
            collision_threshold: core_config::DEFAULT_COLLISION_THRESHOLD,
            find_hollow_sites: true,
            knn_neighbors: core_config::DEFAULT_KNN_NEIGHBORS,
            hollow_deduplication_distance: core_config::DEFAULT_DEDUPLICATION_DISTANCE,
            find_on_top_sites: true,
            on_top_target_species: core_config::DEFAULT_ON_TOP_TARGET.to_string(),
            rotation_method: core_config::RotationMethod::Normal,
            rotation_count: core_config::DEFAULT_ROTATION_COUNT,
            rotation_step: core_config::DEFAULT_ROTATION_STEP,
            max_iterations: core_config::DEFAULT_MAX_ITERATIONS,
            scoring_oracle: MORSE.to_string(),
            surrogate_oracle: LENNARD_JONES.to_string(),
            parallel_sites: false,
            generate_mesh: true,
            max_edge_length: core_config::DEFAULT_MAX_EDGE_LENGTH,
            smooth_iterations: core_config::DEFAULT_SMOOTH_ITERATIONS,
        }
    }
}
