mod defaults;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use absorb::core::models::slab::SurfaceAxis;
use absorb::core::oracle::registry::OracleParams;
use absorb::engine::config as core_config;
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialPlacementSection {
    surface_axis: Option<usize>,
    place_on_bottom: Option<bool>,
    adsorption_height: Option<f64>,
    vacuum: Option<f64>,
    surface_search_depth: Option<f64>,
    collision_threshold: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSitesSection {
    find_hollow_sites: Option<bool>,
    knn_neighbors: Option<usize>,
    hollow_deduplication_distance: Option<f64>,
    find_on_top_sites: Option<bool>,
    on_top_target_species: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialRotationSection {
    method: Option<String>,
    count: Option<usize>,
    step: Option<f64>,
    max_iterations: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialScoringSection {
    oracle: Option<String>,
    surrogate: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialExecutionSection {
    parallel_sites: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialMeshSection {
    generate: Option<bool>,
    max_edge_length: Option<f64>,
    keep_long_edges: Option<bool>,
    smooth_iterations: Option<usize>,
    color_scheme: Option<String>,
}

/// Settings for one `absorb run`, after merging defaults, file, `--set` values and flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub adsorption: core_config::AdsorptionConfig,
    pub scoring_oracle: String,
    pub surrogate_oracle: String,
    pub oracle_params: OracleParams,
    /// `None` when mesh generation is switched off.
    pub mesh: Option<core_config::MeshConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    placement: Option<PartialPlacementSection>,
    sites: Option<PartialSitesSection>,
    rotation: Option<PartialRotationSection>,
    scoring: Option<PartialScoringSection>,
    execution: Option<PartialExecutionSection>,
    mesh: Option<PartialMeshSection>,
    oracle: Option<OracleParams>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: '{}'", key, value))
    })
}

fn parse_setting<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = core_config::ConfigError>,
{
    value
        .parse()
        .map_err(|e: core_config::ConfigError| CliError::Config(e.to_string()))
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let defaults = DefaultsConfig::default();
        let placement = self.placement.take().unwrap_or_default();
        let sites = self.sites.take().unwrap_or_default();
        let rotation = self.rotation.take().unwrap_or_default();
        let scoring = self.scoring.take().unwrap_or_default();
        let execution = self.execution.take().unwrap_or_default();
        let mesh = self.mesh.take().unwrap_or_default();

        let rotation_method = match args.rotation_method.as_deref().or(rotation.method.as_deref()) {
            Some(method) => parse_setting(method)?,
            None => defaults.rotation_method,
        };

        let surface_axis = args
            .surface_axis
            .or(placement.surface_axis)
            .unwrap_or(defaults.surface_axis);

        let adsorption = core_config::AdsorptionConfigBuilder::new()
            .surface_axis(surface_axis)
            .place_on_bottom(
                args.side
                    .place_on_bottom()
                    .or(placement.place_on_bottom)
                    .unwrap_or(defaults.place_on_bottom),
            )
            .adsorption_height(
                args.height
                    .or(placement.adsorption_height)
                    .unwrap_or(defaults.adsorption_height),
            )
            .vacuum(args.vacuum.or(placement.vacuum).unwrap_or(defaults.vacuum))
            .surface_search_depth(
                args.surface_depth
                    .or(placement.surface_search_depth)
                    .unwrap_or(defaults.surface_search_depth),
            )
            .collision_threshold(
                args.collision_threshold
                    .or(placement.collision_threshold)
                    .unwrap_or(defaults.collision_threshold),
            )
            .find_hollow_sites(Self::merge_switch(
                args.no_hollow,
                sites.find_hollow_sites,
                defaults.find_hollow_sites,
            ))
            .knn_neighbors(
                args.knn
                    .or(sites.knn_neighbors)
                    .unwrap_or(defaults.knn_neighbors),
            )
            .hollow_deduplication_distance(
                args.dedup_distance
                    .or(sites.hollow_deduplication_distance)
                    .unwrap_or(defaults.hollow_deduplication_distance),
            )
            .find_on_top_sites(Self::merge_switch(
                args.no_on_top,
                sites.find_on_top_sites,
                defaults.find_on_top_sites,
            ))
            .on_top_target_species(
                args.target_species
                    .as_deref()
                    .or(sites.on_top_target_species.as_deref())
                    .unwrap_or(&defaults.on_top_target_species),
            )
            .rotation_method(rotation_method)
            .rotation_count(
                args.rotation_count
                    .or(rotation.count)
                    .unwrap_or(defaults.rotation_count),
            )
            .rotation_step(
                args.rotation_step
                    .or(rotation.step)
                    .unwrap_or(defaults.rotation_step),
            )
            .max_iterations(rotation.max_iterations.unwrap_or(defaults.max_iterations))
            .parallel_sites(
                args.parallel_sites
                    || execution.parallel_sites.unwrap_or(defaults.parallel_sites),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mesh = Self::merge_mesh(
            args.no_mesh,
            mesh,
            adsorption.placement.surface_axis,
            &defaults,
        )?;

        Ok(RunConfig {
            adsorption,
            scoring_oracle: args
                .scoring_oracle
                .clone()
                .or(scoring.oracle)
                .unwrap_or(defaults.scoring_oracle),
            surrogate_oracle: args
                .surrogate_oracle
                .clone()
                .or(scoring.surrogate)
                .unwrap_or(defaults.surrogate_oracle),
            oracle_params: self.oracle.unwrap_or_default(),
            mesh,
        })
    }

    /// A `--no-*` flag forces the switch off; otherwise the file value or the default applies.
    fn merge_switch(cli_disabled: bool, file_val: Option<bool>, default: bool) -> bool {
        if cli_disabled {
            false
        } else {
            file_val.unwrap_or(default)
        }
    }

    fn merge_mesh(
        cli_no_mesh: bool,
        partial: PartialMeshSection,
        surface_axis: SurfaceAxis,
        defaults: &DefaultsConfig,
    ) -> Result<Option<core_config::MeshConfig>> {
        if cli_no_mesh || !partial.generate.unwrap_or(defaults.generate_mesh) {
            return Ok(None);
        }
        let max_edge_length = if partial.keep_long_edges.unwrap_or(false) {
            None
        } else {
            Some(partial.max_edge_length.unwrap_or(defaults.max_edge_length))
        };
        let color_scheme = match partial.color_scheme.as_deref() {
            Some(name) => parse_setting(name)?,
            None => core_config::ColorScheme::default(),
        };
        let config = core_config::MeshConfig {
            surface_axis,
            max_edge_length,
            smooth_iterations: partial
                .smooth_iterations
                .unwrap_or(defaults.smooth_iterations),
            color_scheme,
        };
        config
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        Ok(Some(config))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();

            match key {
                "placement.surface-axis" => {
                    self.placement.get_or_insert_with(Default::default).surface_axis =
                        Some(parse_value(key, value_str)?);
                }
                "placement.place-on-bottom" => {
                    self.placement.get_or_insert_with(Default::default).place_on_bottom =
                        Some(parse_value(key, value_str)?);
                }
                "placement.adsorption-height" => {
                    self.placement.get_or_insert_with(Default::default).adsorption_height =
                        Some(parse_value(key, value_str)?);
                }
                "placement.vacuum" => {
                    self.placement.get_or_insert_with(Default::default).vacuum =
                        Some(parse_value(key, value_str)?);
                }
                "placement.surface-search-depth" => {
                    self.placement
                        .get_or_insert_with(Default::default)
                        .surface_search_depth = Some(parse_value(key, value_str)?);
                }
                "placement.collision-threshold" => {
                    self.placement
                        .get_or_insert_with(Default::default)
                        .collision_threshold = Some(parse_value(key, value_str)?);
                }
                "sites.find-hollow-sites" => {
                    self.sites.get_or_insert_with(Default::default).find_hollow_sites =
                        Some(parse_value(key, value_str)?);
                }
                "sites.knn-neighbors" => {
                    self.sites.get_or_insert_with(Default::default).knn_neighbors =
                        Some(parse_value(key, value_str)?);
                }
                "sites.hollow-deduplication-distance" => {
                    self.sites
                        .get_or_insert_with(Default::default)
                        .hollow_deduplication_distance = Some(parse_value(key, value_str)?);
                }
                "sites.find-on-top-sites" => {
                    self.sites.get_or_insert_with(Default::default).find_on_top_sites =
                        Some(parse_value(key, value_str)?);
                }
                "sites.on-top-target-species" => {
                    self.sites
                        .get_or_insert_with(Default::default)
                        .on_top_target_species = Some(value_str.trim().to_string());
                }
                "rotation.method" => {
                    self.rotation.get_or_insert_with(Default::default).method =
                        Some(value_str.trim().to_string());
                }
                "rotation.count" => {
                    self.rotation.get_or_insert_with(Default::default).count =
                        Some(parse_value(key, value_str)?);
                }
                "rotation.step" => {
                    self.rotation.get_or_insert_with(Default::default).step =
                        Some(parse_value(key, value_str)?);
                }
                "rotation.max-iterations" => {
                    self.rotation.get_or_insert_with(Default::default).max_iterations =
                        Some(parse_value(key, value_str)?);
                }
                "scoring.oracle" => {
                    self.scoring.get_or_insert_with(Default::default).oracle =
                        Some(value_str.trim().to_string());
                }
                "scoring.surrogate" => {
                    self.scoring.get_or_insert_with(Default::default).surrogate =
                        Some(value_str.trim().to_string());
                }
                "execution.parallel-sites" => {
                    self.execution
                        .get_or_insert_with(Default::default)
                        .parallel_sites = Some(parse_value(key, value_str)?);
                }
                "mesh.generate" => {
                    self.mesh.get_or_insert_with(Default::default).generate =
                        Some(parse_value(key, value_str)?);
                }
                "mesh.max-edge-length" => {
                    self.mesh.get_or_insert_with(Default::default).max_edge_length =
                        Some(parse_value(key, value_str)?);
                }
                "mesh.smooth-iterations" => {
                    self.mesh.get_or_insert_with(Default::default).smooth_iterations =
                        Some(parse_value(key, value_str)?);
                }
                "mesh.color-scheme" => {
                    self.mesh.get_or_insert_with(Default::default).color_scheme =
                        Some(value_str.trim().to_string());
                }
                "oracle.lennard-jones.sigma" => {
                    self.oracle
                        .get_or_insert_with(Default::default)
                        .lennard_jones
                        .sigma = parse_value(key, value_str)?;
                }
                "oracle.lennard-jones.epsilon" => {
                    self.oracle
                        .get_or_insert_with(Default::default)
                        .lennard_jones
                        .epsilon = parse_value(key, value_str)?;
                }
                "oracle.morse.epsilon" => {
                    self.oracle
                        .get_or_insert_with(Default::default)
                        .morse
                        .epsilon = parse_value(key, value_str)?;
                }
                "oracle.morse.r0" => {
                    self.oracle.get_or_insert_with(Default::default).morse.r0 =
                        parse_value(key, value_str)?;
                }
                "oracle.morse.rho0" => {
                    self.oracle.get_or_insert_with(Default::default).morse.rho0 =
                        parse_value(key, value_str)?;
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
