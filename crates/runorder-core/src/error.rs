//! Error types for runorder-core.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::notebook::Cell;

/// Result type for runorder-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or locating notebooks.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a notebook file.
    #[error("failed to read notebook {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The document is not a usable notebook (bad JSON or no `cells` array).
    #[error("invalid notebook: {0}")]
    InvalidNotebook(String),

    /// A path that is neither a directory nor an `.ipynb` file.
    #[error(
        "cannot check {}: must be a path to a notebook file with the .ipynb extension, or a directory",
        .0.display()
    )]
    InvalidPath(PathBuf),

    /// Walking a directory for notebooks failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Verification of a notebook failed.
    #[error(transparent)]
    InvalidRun(#[from] InvalidNotebookRun),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A code cell broke the strict `1, 2, 3, ...` execution sequence.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// A non-empty code cell has no execution count.
    #[error(
        "Code cell #{index} was not run. The previous cell was #{previous}.\n\nCell contents:\n\n{cell}"
    )]
    CellNotRun {
        /// Position among the notebook's code cells.
        index: usize,
        /// Execution count of the last checked cell (0 when none).
        previous: u64,
        cell: Cell,
    },

    /// The execution count is not exactly one more than the previous one.
    #[error(
        "Cells were not run sequentially. Code cell #{index} has execution count {actual}, \
         expected {expected} (the previous cell was #{previous}).\n\nCell contents:\n\n{cell}",
        previous = .expected - 1
    )]
    RunOutOfOrder {
        index: usize,
        expected: u64,
        actual: u64,
        cell: Cell,
    },
}

impl OrderError {
    /// Execution count of the cell checked before the offending one.
    pub fn previous(&self) -> u64 {
        match self {
            Self::CellNotRun { previous, .. } => *previous,
            Self::RunOutOfOrder { expected, .. } => expected - 1,
        }
    }

    /// The offending cell.
    pub fn cell(&self) -> &Cell {
        match self {
            Self::CellNotRun { cell, .. } | Self::RunOutOfOrder { cell, .. } => cell,
        }
    }
}

/// Re-executing a notebook in its scratch directory failed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The executor program could not be located.
    #[error("executor `{program}` not found: {message}")]
    ExecutorNotFound { program: String, message: String },

    /// The executor program could not be started.
    #[error("failed to start executor `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the executor to exit failed.
    #[error("failed waiting for executor `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Creating, writing or reading the scratch directory failed.
    #[error("scratch notebook error: {0}")]
    Scratch(#[from] std::io::Error),

    /// The executor exited unsuccessfully.
    #[error("Notebook failed to run ({status}).\n\nError message: {stderr}")]
    Failed {
        /// Rendered exit status.
        status: String,
        /// Executor diagnostics with terminal color sequences removed.
        stderr: String,
    },

    /// The executor succeeded but its result could not be parsed.
    #[error("executor produced an unreadable notebook {}: {message}", .path.display())]
    UnreadableResult { path: PathBuf, message: String },

    /// The run was cancelled through its kill handle.
    #[error("re-execution was cancelled")]
    Cancelled,
}

/// A re-executed cell produced different outputs than the recorded ones.
#[derive(Debug, Clone, Error)]
pub enum OutputError {
    #[error(
        "Cell #{index} output does not match the expected output.\n\nCell contents:\n\n{cell}\n\nExpected output:\n\n> {}",
        render_outputs(.expected)
    )]
    Mismatch {
        /// Position among the notebook's code cells.
        index: usize,
        /// The freshly executed cell.
        cell: Cell,
        /// Outputs recorded in the original notebook.
        expected: Vec<Value>,
    },
}

/// Any failure from one verification stage.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A notebook failed verification.
#[derive(Debug, Error)]
#[error("Notebook {} was not run in order.\n\n{source}", .path.display())]
pub struct InvalidNotebookRun {
    pub path: PathBuf,
    pub source: VerifyError,
}

impl InvalidNotebookRun {
    pub fn kind(&self) -> FailureKind {
        self.source.kind()
    }
}

impl VerifyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Order(OrderError::CellNotRun { .. }) => FailureKind::CellNotRun,
            Self::Order(OrderError::RunOutOfOrder { .. }) => FailureKind::RunOutOfOrder,
            Self::Run(_) => FailureKind::ReExecutionFailed,
            Self::Output(_) => FailureKind::OutputMismatch,
        }
    }
}

/// Classification of a verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    CellNotRun,
    RunOutOfOrder,
    ReExecutionFailed,
    OutputMismatch,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CellNotRun => "cell-not-run",
            Self::RunOutOfOrder => "run-out-of-order",
            Self::ReExecutionFailed => "re-execution-failed",
            Self::OutputMismatch => "output-mismatch",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn render_outputs(outputs: &[Value]) -> String {
    serde_json::to_string(outputs).unwrap_or_else(|_| format!("{outputs:?}"))
}
