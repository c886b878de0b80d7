//! Isolated re-execution of notebooks.
//!
//! # Architecture
//!
//! ```text
//! Notebook (as loaded)
//!     │
//!     └── ProcessRunner
//!             │
//!             ├── Scratch (private temp dir, removed on drop)
//!             │       └── notebook.ipynb   ← document written verbatim
//!             │
//!             ├── executor process (own process group)
//!             │       └── jupyter nbconvert --to notebook --execute ...
//!             │
//!             ├── KillHandle → SIGKILL to the whole group
//!             │
//!             └── executed.ipynb → Notebook
//! ```
//!
//! # Module Structure
//!
//! - `process` - ProcessRunner and its kill handle
//! - `scratch` - Scoped scratch directory

mod process;
mod scratch;

pub use process::{KillHandle, ProcessRunner, strip_ansi};
pub use scratch::Scratch;

use crate::error::RunError;
use crate::notebook::Notebook;

/// Something that can execute a notebook end to end and return the result.
pub trait NotebookRunner {
    /// Execute every cell of `notebook` in a fresh environment.
    fn run(&self, notebook: &Notebook) -> Result<Notebook, RunError>;
}

impl<R: NotebookRunner + ?Sized> NotebookRunner for &R {
    fn run(&self, notebook: &Notebook) -> Result<Notebook, RunError> {
        (**self).run(notebook)
    }
}
