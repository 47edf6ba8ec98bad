use crate::error::{CliError, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self},
    prelude::*,
};

/// Target prefix shared by the library and the binary.
const ABSORB_TARGET: &str = "absorb";

fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// ABSORB events at `level`; dependencies never below WARN.
fn absorb_targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_target(ABSORB_TARGET, level)
        .with_default(level.min(LevelFilter::WARN))
}

/// The log file keeps per-site DEBUG detail even when the console is quiet.
fn file_level(verbosity: u8) -> LevelFilter {
    console_level(verbosity, false).max(LevelFilter::DEBUG)
}

fn open_log_file(path: &Path) -> Result<File> {
    let mut file = File::create(path).map_err(CliError::Io)?;
    writeln!(
        file,
        "# absorb {} log, args: {}",
        env!("CARGO_PKG_VERSION"),
        std::env::args().collect::<Vec<_>>().join(" ")
    )
    .map_err(CliError::Io)?;
    Ok(file)
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(absorb_targets(console_level(verbosity, quiet)));

    let subscriber = tracing_subscriber::registry().with(stderr_layer);

    if let Some(path) = log_file {
        let file_layer = fmt::layer()
            .with_writer(open_log_file(&path)?)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(absorb_targets(file_level(verbosity)));

        subscriber.with(file_layer).init();
    } else {
        subscriber.init();
    }

    Ok(())
}
