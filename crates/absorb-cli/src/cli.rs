use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "ABSORB Developers",
    version,
    about = "ABSORB CLI - Find favorable adsorption sites of a molecule on a crystalline slab, optimize its orientation, and mesh the surface energy landscape.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search adsorption sites on a substrate, optimize the adsorbate at each, and export the ranked results.
    Run(RunArgs),
    /// Regenerate the surface energy mesh from a finished results directory.
    Mesh(MeshArgs),
    /// List the registered energy oracles.
    Oracles,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the substrate structure (CIF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub substrate: PathBuf,

    /// Path to the adsorbate structure (CIF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub adsorbate: PathBuf,

    /// Directory receiving the exported structures and result files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Placement Overrides ---
    /// Index of the axis normal to the surface (0 = x, 1 = y, 2 = z).
    #[arg(long, value_name = "INT")]
    pub surface_axis: Option<usize>,

    /// Place the adsorbate on the top or bottom face of the slab.
    #[command(flatten)]
    pub side: SideSelection,

    /// Override the adsorption height above each site, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub height: Option<f64>,

    /// Override the vacuum padding along the surface axis, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub vacuum: Option<f64>,

    /// Override the depth below the outermost layer that still counts as surface, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub surface_depth: Option<f64>,

    /// Override the minimum allowed adsorbate-slab separation, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub collision_threshold: Option<f64>,

    // --- Site Search Overrides ---
    /// Disable the hollow site finder.
    #[arg(long)]
    pub no_hollow: bool,

    /// Disable the on-top site finder.
    #[arg(long)]
    pub no_on_top: bool,

    /// Override the number of nearest neighbors used to form hollow sites.
    #[arg(short = 'k', long, value_name = "INT")]
    pub knn: Option<usize>,

    /// Override the minimum distance between two distinct hollow sites, in Å.
    #[arg(long, value_name = "FLOAT")]
    pub dedup_distance: Option<f64>,

    /// Override the species that on-top sites sit on (e.g. 'O').
    #[arg(short = 't', long, value_name = "SYMBOL")]
    pub target_species: Option<String>,

    // --- Rotation Overrides ---
    /// Override the orientation strategy ('normal' or 'sphere').
    #[arg(short = 'm', long, value_name = "METHOD")]
    pub rotation_method: Option<String>,

    /// Override the number of sphere axes sampled by the 'sphere' strategy.
    #[arg(long, value_name = "INT")]
    pub rotation_count: Option<usize>,

    /// Override the angle increment of the 'sphere' strategy, in degrees.
    #[arg(long, value_name = "FLOAT")]
    pub rotation_step: Option<f64>,

    // --- Scoring Overrides ---
    /// Oracle used for the final adsorption energies.
    #[arg(long, value_name = "NAME")]
    pub scoring_oracle: Option<String>,

    /// Oracle used during orientation search.
    #[arg(long, value_name = "NAME")]
    pub surrogate_oracle: Option<String>,

    // --- Execution ---
    /// Process sites in parallel on the thread pool.
    #[arg(long)]
    pub parallel_sites: bool,

    /// Skip regenerating the surface energy mesh after the run.
    #[arg(long)]
    pub no_mesh: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S rotation.method=sphere
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags selecting the slab face.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = false, multiple = false)]
pub struct SideSelection {
    /// Place on the face with the largest coordinate along the surface axis.
    #[arg(long)]
    pub top: bool,
    /// Place on the face with the smallest coordinate along the surface axis.
    #[arg(long)]
    pub bottom: bool,
}

impl SideSelection {
    /// `Some(true)` when the bottom face was requested explicitly.
    pub fn place_on_bottom(&self) -> Option<bool> {
        match (self.top, self.bottom) {
            (true, _) => Some(false),
            (_, true) => Some(true),
            _ => None,
        }
    }
}

/// Arguments for the `mesh` subcommand.
#[derive(Args, Debug)]
pub struct MeshArgs {
    /// Results directory written by `absorb run`.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub results: PathBuf,

    /// Index of the axis normal to the surface (0 = x, 1 = y, 2 = z).
    #[arg(long, value_name = "INT", default_value_t = 2)]
    pub surface_axis: usize,

    /// Drop triangles with an edge longer than this, in Å.
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub max_edge_length: Option<f64>,

    /// Keep every triangle regardless of edge length.
    #[arg(long, conflicts_with = "max_edge_length")]
    pub keep_long_edges: bool,

    /// Number of Laplacian smoothing rounds applied to vertex energies.
    #[arg(long, value_name = "INT")]
    pub smooth_iterations: Option<usize>,

    /// Color scheme for vertex colors ('default', 'hot' or 'cool').
    #[arg(long, value_name = "NAME")]
    pub color_scheme: Option<String>,
}
