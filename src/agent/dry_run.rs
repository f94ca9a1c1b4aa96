//! Dry-run wrapper: logs what the wrapped agent would do and does nothing.

use std::path::Path;
use tracing::info;

use super::{ActionOutcome, ExecutionAgent};
use crate::error::Result;
use crate::types::FileMode;

pub struct DryRunAgent<A: ExecutionAgent> {
    inner: A,
}

impl<A: ExecutionAgent> DryRunAgent<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

impl<A: ExecutionAgent> ExecutionAgent for DryRunAgent<A> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Availability is still checked against the real agent.
    fn probe(&self) -> Result<()> {
        self.inner.probe()
    }

    fn ensure_directory(
        &self,
        path: &Path,
        owner: Option<&str>,
        recursive: bool,
    ) -> ActionOutcome {
        info!(
            "[DRY RUN] {}: ensure directory {} owner={:?} recursive={}",
            self.inner.name(),
            path.display(),
            owner,
            recursive
        );
        ActionOutcome::skipped()
    }

    fn run_shell(&self, command: &str) -> ActionOutcome {
        info!("[DRY RUN] {}: run {:?}", self.inner.name(), command);
        ActionOutcome::skipped()
    }

    fn set_mode(&self, path: &Path, mode: FileMode) -> ActionOutcome {
        info!("[DRY RUN] {}: chmod {} {}", self.inner.name(), mode, path.display());
        ActionOutcome::skipped()
    }
}
