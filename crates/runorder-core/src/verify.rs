//! Per-notebook verification pass.
//!
//! ```text
//! Start ─► check_order ─┬─► (skip re-execution) ─────────────────────► Success
//!                       └─► runner.run ─► compare_outputs ───────────► Success
//!         any failure ──────────────────────────────────────────────► InvalidNotebookRun
//! ```

use std::path::Path;

use crate::compare::compare_outputs;
use crate::error::{InvalidNotebookRun, Result, VerifyError};
use crate::execute::{NotebookRunner, ProcessRunner};
use crate::notebook::Notebook;
use crate::order::check_order;

/// Options for one verification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Only check execution order; never re-execute.
    ///
    /// Faster, but misses notebooks whose recorded outputs are stale.
    pub skip_reexecution: bool,
}

/// Runs order checking, then re-execution and output comparison.
pub struct Verifier<R = ProcessRunner> {
    runner: R,
    options: VerifyOptions,
}

impl<R: NotebookRunner> Verifier<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            options: VerifyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: VerifyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> VerifyOptions {
        self.options
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Verify a loaded notebook. `path` only identifies it in reports.
    pub fn verify(
        &self,
        path: &Path,
        notebook: &Notebook,
    ) -> std::result::Result<(), InvalidNotebookRun> {
        self.check(notebook).map_err(|source| InvalidNotebookRun {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "notebook verified");
        Ok(())
    }

    /// Load a notebook from disk and verify it.
    pub fn verify_file(&self, path: &Path) -> Result<()> {
        let notebook = Notebook::read_from_file(path)?;
        self.verify(path, &notebook)?;
        Ok(())
    }

    fn check(&self, notebook: &Notebook) -> std::result::Result<(), VerifyError> {
        check_order(notebook)?;

        if self.options.skip_reexecution {
            tracing::debug!("re-execution skipped, only execution order was checked");
            return Ok(());
        }

        let executed = self.runner.run(notebook)?;
        compare_outputs(notebook, &executed)?;
        Ok(())
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(ProcessRunner::default())
    }
}
