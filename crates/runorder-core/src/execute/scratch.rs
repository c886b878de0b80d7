//! Scoped scratch directory for one re-execution.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::RunError;
use crate::notebook::Notebook;

/// File name of the notebook handed to the executor.
const INPUT_FILE: &str = "notebook.ipynb";

/// Stem passed to the executor's `--output`; the executor adds `.ipynb`.
pub(crate) const OUTPUT_STEM: &str = "executed";

/// A uniquely named, private directory holding one notebook run.
///
/// The directory and everything in it is removed when the value is dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a scratch directory under `root`, or the system temp dir.
    pub fn new(root: Option<&Path>) -> Result<Self, RunError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("runorder-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn input_path(&self) -> PathBuf {
        self.path().join(INPUT_FILE)
    }

    pub fn output_path(&self) -> PathBuf {
        self.path().join(format!("{OUTPUT_STEM}.ipynb"))
    }

    /// Write the notebook document, unchanged, as the executor's input.
    pub fn write_input(&self, notebook: &Notebook) -> Result<PathBuf, RunError> {
        let path = self.input_path();
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, notebook)
            .map_err(|e| RunError::Scratch(e.into()))?;
        writer.flush()?;
        Ok(path)
    }

    /// Read back the executed notebook.
    pub fn read_output(&self) -> Result<Notebook, RunError> {
        let path = self.output_path();
        let unreadable = |message: String| RunError::UnreadableResult {
            path: path.clone(),
            message,
        };
        let content = fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
        content
            .parse::<Notebook>()
            .map_err(|e| unreadable(e.to_string()))
    }
}
