//! Out-of-process notebook re-execution.
//!
//! The executor runs in its own process group so that it, and any kernel it
//! starts, can be terminated together through a [`KillHandle`].

use std::process::{Command, Stdio};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use regex::Regex;

use super::NotebookRunner;
use super::scratch::{OUTPUT_STEM, Scratch};
use crate::config::ExecutorConfig;
use crate::error::RunError;
use crate::notebook::Notebook;

/// CSI sequences such as `\x1b[31m` emitted by colored tracebacks.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B\[[0-?]*[ -/]*[@-~]").expect("ANSI escape pattern is valid")
});

/// Remove terminal color and cursor control sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}

/// Thread-safe handle for killing a running executor from another thread.
///
/// Once killed, the handle stays killed: the current run fails with
/// [`RunError::Cancelled`] and later runs refuse to start.
#[derive(Clone, Default)]
pub struct KillHandle {
    inner: Arc<Mutex<KillState>>,
}

#[derive(Default)]
struct KillState {
    /// Process group of the running executor.
    pid: Option<u32>,
    killed: bool,
}

impl KillHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the running executor, if any, and cancel future runs.
    pub fn kill(&self) {
        let mut state = self.lock();
        state.killed = true;
        if let Some(pid) = state.pid {
            tracing::debug!(pid, "killing executor process group");
            kill_process_group(pid);
        }
    }

    pub fn is_killed(&self) -> bool {
        self.lock().killed
    }

    fn attach(&self, pid: u32) {
        let mut state = self.lock();
        if state.killed {
            kill_process_group(pid);
        }
        state.pid = Some(pid);
    }

    fn detach(&self) {
        self.lock().pid = None;
    }

    fn lock(&self) -> MutexGuard<'_, KillState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn kill_process_group(pid: u32) {
    #[cfg(unix)]
    {
        // SIGKILL for immediate termination of the executor and its kernel
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    {
        tracing::warn!(pid, "killing the executor is only supported on unix");
    }
}

/// Runs notebooks through an external convert-and-execute command.
pub struct ProcessRunner {
    config: ExecutorConfig,
    kill_handle: KillHandle,
}

impl ProcessRunner {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            kill_handle: KillHandle::new(),
        }
    }

    /// Share an existing kill handle with this runner.
    pub fn with_kill_handle(mut self, kill_handle: KillHandle) -> Self {
        self.kill_handle = kill_handle;
        self
    }

    pub fn kill_handle(&self) -> KillHandle {
        self.kill_handle.clone()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl NotebookRunner for ProcessRunner {
    fn run(&self, notebook: &Notebook) -> Result<Notebook, RunError> {
        if self.kill_handle.is_killed() {
            return Err(RunError::Cancelled);
        }

        let program = self.config.resolve()?;
        let scratch = Scratch::new(self.config.scratch_root.as_deref())?;
        let input = scratch.write_input(notebook)?;

        let mut command = Command::new(&program);
        command
            .args(&self.config.args)
            .args(["--to", "notebook", "--execute", "--output-dir"])
            .arg(scratch.path())
            .args(["--output", OUTPUT_STEM])
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        tracing::info!(
            program = %program.display(),
            scratch = %scratch.path().display(),
            "re-executing notebook"
        );

        let child = command.spawn().map_err(|source| RunError::Spawn {
            program: program.display().to_string(),
            source,
        })?;
        self.kill_handle.attach(child.id());
        let output = child.wait_with_output();
        self.kill_handle.detach();
        let output = output.map_err(|source| RunError::Wait {
            program: program.display().to_string(),
            source,
        })?;

        if self.kill_handle.is_killed() {
            return Err(RunError::Cancelled);
        }

        if !output.status.success() {
            let stderr = strip_ansi(&String::from_utf8_lossy(&output.stderr));
            tracing::debug!(status = %output.status, "executor failed");
            return Err(RunError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim_end().to_string(),
            });
        }

        let executed = scratch.read_output()?;
        let (expected, actual) = (notebook.code_cells().len(), executed.code_cells().len());
        if expected != actual {
            return Err(RunError::UnreadableResult {
                path: scratch.output_path(),
                message: format!("expected {expected} code cells, found {actual}"),
            });
        }

        tracing::debug!(cells = executed.cells().len(), "re-execution finished");
        Ok(executed)
    }
}
