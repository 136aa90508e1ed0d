use std::path::PathBuf;

use tracing::{debug, info};

use crate::pattern::Pattern;

/// Everything a run needs, resolved up front by the caller.
#[derive(Debug, Clone)]
pub struct ApplyConfig {
    pub base_dir: PathBuf,
    pub pattern: Pattern,
    /// Run the whole pipeline but skip the create call.
    pub dry_run: bool,
    pub on_error: FailurePolicy,
}

impl ApplyConfig {
    pub fn new(base_dir: impl Into<PathBuf>, pattern: Pattern) -> Self {
        Self {
            base_dir: base_dir.into(),
            pattern,
            dry_run: false,
            on_error: FailurePolicy::default(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn on_error(mut self, policy: FailurePolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            base_dir = %self.base_dir.display(),
            pattern = %self.pattern,
            dry_run = self.dry_run,
            on_error = ?self.on_error,
            "Loaded ApplyConfig"
        );
        debug!(?self, "ApplyConfig loaded (full debug)");
    }
}

/// What to do when a single file fails to read, decode or create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing file and return its error.
    #[default]
    FailFast,
    /// Log the failure, record it in the report and move on to the next file.
    Continue,
}
