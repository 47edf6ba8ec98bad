use absorb::engine::progress::{Progress, ProgressCallback, SiteStatus};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

/// Running counts of how sites ended, shown next to the optimization bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SiteTally {
    pub scored: usize,
    pub collisions: usize,
    pub failures: usize,
    pub best_energy: Option<f64>,
}

impl SiteTally {
    fn record(&mut self, status: SiteStatus) {
        match status {
            SiteStatus::Scored { adsorption_energy } => {
                self.scored += 1;
                self.best_energy = Some(
                    self.best_energy
                        .map_or(adsorption_energy, |best| best.min(adsorption_energy)),
                );
            }
            SiteStatus::Collision => self.collisions += 1,
            SiteStatus::Failed => self.failures += 1,
        }
    }
}

impl fmt::Display for SiteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scored, {} collided, {} failed",
            self.scored, self.collisions, self.failures
        )?;
        match self.best_energy {
            Some(best) => write!(f, ", best {best:.4} eV"),
            None => write!(f, ", best n/a"),
        }
    }
}

struct BarState {
    pb: ProgressBar,
    phase: Option<&'static str>,
    tally: SiteTally,
}

/// Renders workflow progress on stderr: a spinner per phase and a site bar with a live tally.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(Self::spinner_style());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState {
                pb,
                phase: None,
                tally: SiteTally::default(),
            })),
        }
    }

    pub fn tally(&self) -> SiteTally {
        self.state
            .lock()
            .map(|state| state.tally)
            .unwrap_or_default()
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress state mutex was poisoned. Cannot update progress.");
                return;
            };
            state.apply(progress);
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:.bold} [{bar:32.cyan/blue}] {pos}/{len} {msg} (eta {eta_secs})",
        )
        .expect("Failed to create bar style template")
        .with_key(
            "eta_secs",
            |state: &ProgressState, w: &mut dyn fmt::Write| {
                // A failed write only drops the eta from this frame.
                write!(w, "{:.0}s", state.eta().as_secs_f64()).ok();
            },
        )
        .progress_chars("=> ")
    }
}

impl BarState {
    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = Some(name);
                self.pb.reset();
                self.pb.set_length(0);
                self.pb.set_style(CliProgressHandler::spinner_style());
                self.pb.set_prefix(name);
                self.pb.set_message("");
                self.pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
            }
            Progress::PhaseFinish => {
                self.pb.disable_steady_tick();
                let done = match self.phase.take() {
                    Some(name) => format!("✓ {name}"),
                    None => "✓ Done".to_string(),
                };
                self.pb.set_style(CliProgressHandler::spinner_style());
                self.pb.set_prefix("");
                self.pb.finish_with_message(done);
            }
            Progress::TaskStart { total_steps } => {
                self.tally = SiteTally::default();
                self.pb.disable_steady_tick();
                self.pb.reset();
                self.pb.set_length(total_steps);
                self.pb.set_position(0);
                self.pb.set_style(CliProgressHandler::bar_style());
                self.pb.set_prefix(self.phase.unwrap_or("Working"));
                self.pb.set_message(self.tally.to_string());
            }
            Progress::SiteFinished {
                site_index,
                site_type,
                status,
            } => {
                self.tally.record(status);
                match status {
                    SiteStatus::Collision => self
                        .pb
                        .println(format!("  ⚠ site {site_index} ({site_type}) collided, skipped")),
                    SiteStatus::Failed => self
                        .pb
                        .println(format!("  ✗ site {site_index} ({site_type}) failed, skipped")),
                    SiteStatus::Scored { .. } => {}
                }
                self.pb.set_message(self.tally.to_string());
            }
            Progress::TaskIncrement => self.pb.inc(1),
            Progress::TaskFinish => {
                let length = self.pb.length().unwrap_or(0);
                if self.pb.position() < length {
                    self.pb.set_position(length);
                }
                self.pb.finish_with_message(self.tally.to_string());
            }
            Progress::StatusUpdate { text } => {
                if !self.pb.is_finished() {
                    match self.phase {
                        Some(name) => self.pb.set_prefix(format!("{name} · {text}")),
                        None => self.pb.set_prefix(text),
                    }
                }
            }
            Progress::Message(msg) => self.pb.println(format!("  {msg}")),
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
