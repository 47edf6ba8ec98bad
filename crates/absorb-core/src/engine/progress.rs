use crate::core::models::site::SiteType;

/// How the evaluation of a single site ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SiteStatus {
    Scored { adsorption_energy: f64 },
    Collision,
    Failed,
}

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// Emitted once per processed site, before its `TaskIncrement`.
    SiteFinished {
        site_index: usize,
        site_type: SiteType,
        status: SiteStatus,
    },

    /// Replaces the status line (e.g. the site currently being processed).
    StatusUpdate { text: String },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn status(&self, text: impl Into<String>) {
        if self.callback.is_some() {
            self.report(Progress::StatusUpdate { text: text.into() });
        }
    }
}
