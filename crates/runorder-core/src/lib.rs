//! Verification engine for computational notebooks.
//!
//! This crate provides:
//! - A notebook model with directive comments (`# no-run`, `# no-check-output`)
//! - Strict sequential execution order checking
//! - Isolated re-execution through an external executor
//! - Output comparison between recorded and fresh results
//! - A verifier that composes the stages for one notebook
//! - Notebook discovery for directory trees

pub mod compare;
pub mod config;
pub mod discover;
pub mod error;
pub mod execute;
pub mod notebook;
pub mod order;
pub mod verify;

pub use compare::compare_outputs;
pub use config::{EXECUTOR_ENV, ExecutorConfig};
pub use discover::discover;
pub use error::{
    Error, FailureKind, InvalidNotebookRun, OrderError, OutputError, Result, RunError,
    VerifyError,
};
pub use execute::{KillHandle, NotebookRunner, ProcessRunner};
pub use notebook::{Cell, CellType, Directive, Notebook};
pub use order::check_order;
pub use verify::{Verifier, VerifyOptions};
