use crate::cli::MeshArgs;
use crate::error::{CliError, Result};
use absorb::core::models::slab::SurfaceAxis;
use absorb::engine::config::{ColorScheme, MeshConfig};
use absorb::workflows::mesh::{self, MeshAvailability};
use tracing::info;

pub async fn run(args: MeshArgs) -> Result<()> {
    let config = mesh_config(&args)?;
    info!("Regenerating surface mesh from {:?}", &args.results);

    let outcome =
        tokio::task::block_in_place(|| mesh::generate_from_directory(&args.results, &config))?;

    match outcome {
        MeshAvailability::Available(surface_mesh) => {
            let meta = &surface_mesh.metadata;
            println!(
                "✓ Surface mesh written to: {}",
                args.results.join(absorb::core::io::artifacts::MESH_FILE).display()
            );
            println!(
                "  {} vertices, {} triangles, energies {:.4} to {:.4} eV",
                meta.vertex_count,
                meta.triangle_count,
                meta.energy_range.min,
                meta.energy_range.max
            );
            Ok(())
        }
        MeshAvailability::Unavailable(reason) => Err(CliError::Argument(format!(
            "no mesh could be built from {}: {}",
            args.results.display(),
            reason
        ))),
    }
}

fn mesh_config(args: &MeshArgs) -> Result<MeshConfig> {
    let defaults = MeshConfig::default();
    let surface_axis = SurfaceAxis::from_index(args.surface_axis).ok_or_else(|| {
        CliError::Argument(format!(
            "surface axis must be 0, 1 or 2, got {}",
            args.surface_axis
        ))
    })?;
    let color_scheme = match args.color_scheme.as_deref() {
        Some(name) => name
            .parse::<ColorScheme>()
            .map_err(|e| CliError::Argument(e.to_string()))?,
        None => defaults.color_scheme,
    };
    let config = MeshConfig {
        surface_axis,
        max_edge_length: if args.keep_long_edges {
            None
        } else {
            args.max_edge_length.or(defaults.max_edge_length)
        },
        smooth_iterations: args.smooth_iterations.unwrap_or(defaults.smooth_iterations),
        color_scheme,
    };
    config
        .validate()
        .map_err(|e| CliError::Argument(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn mesh_args(extra: &[&str]) -> MeshArgs {
        let mut argv = vec!["absorb", "mesh", "-r", "results"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Mesh(args) => args,
            _ => panic!("Expected 'mesh' subcommand"),
        }
    }

    #[test]
    fn defaults_match_mesh_config_defaults() {
        assert_eq!(mesh_config(&mesh_args(&[])).unwrap(), MeshConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = mesh_config(&mesh_args(&[
            "--surface-axis",
            "1",
            "--smooth-iterations",
            "0",
            "--color-scheme",
            "cool",
            "--max-edge-length",
            "4.5",
        ]))
        .unwrap();
        assert_eq!(config.surface_axis, SurfaceAxis::Y);
        assert_eq!(config.smooth_iterations, 0);
        assert_eq!(config.color_scheme, ColorScheme::Cool);
        assert_eq!(config.max_edge_length, Some(4.5));
    }

    #[test]
    fn invalid_values_are_argument_errors() {
        assert!(matches!(
            mesh_config(&mesh_args(&["--surface-axis", "5"])),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            mesh_config(&mesh_args(&["--color-scheme", "viridis"])),
            Err(CliError::Argument(_))
        ));
        assert!(matches!(
            mesh_config(&mesh_args(&["--max-edge-length", "-1"])),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn keep_long_edges_disables_filter() {
        let config = mesh_config(&mesh_args(&["--keep-long-edges"])).unwrap();
        assert_eq!(config.max_edge_length, None);
    }
}
