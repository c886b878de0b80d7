//! Executor configuration.
//!
//! The executor is the external command that converts-and-executes a notebook
//! (`jupyter nbconvert` by default). It can be replaced from the command line or
//! through the `RUNORDER_EXECUTOR` environment variable.

use std::path::PathBuf;

use crate::error::RunError;

/// Environment variable holding an executor command line.
pub const EXECUTOR_ENV: &str = "RUNORDER_EXECUTOR";

/// How to invoke the notebook executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Program to run (name looked up on `PATH`, or a path)
    pub program: String,

    /// Arguments placed before the convert-and-execute arguments
    pub args: Vec<String>,

    /// Directory in which scratch directories are created (system temp dir if unset)
    pub scratch_root: Option<PathBuf>,
}

impl ExecutorConfig {
    /// Parse a whitespace separated command line such as `jupyter nbconvert`.
    ///
    /// Returns `None` for a blank command line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            scratch_root: None,
        })
    }

    /// Configuration from `RUNORDER_EXECUTOR`, falling back to the default.
    pub fn from_env() -> Self {
        std::env::var(EXECUTOR_ENV)
            .ok()
            .and_then(|value| Self::from_command_line(&value))
            .unwrap_or_default()
    }

    /// Create scratch directories under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Locate the program.
    pub fn resolve(&self) -> Result<PathBuf, RunError> {
        which::which(&self.program).map_err(|e| RunError::ExecutorNotFound {
            program: self.program.clone(),
            message: e.to_string(),
        })
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: "jupyter".to_string(),
            args: vec!["nbconvert".to_string()],
            scratch_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_nbconvert() {
        let config = ExecutorConfig::default();
        assert_eq!(config.program, "jupyter");
        assert_eq!(config.args, vec!["nbconvert"]);
        assert!(config.scratch_root.is_none());
    }

    #[test]
    fn test_from_command_line() {
        let config = ExecutorConfig::from_command_line("  python3 -m  jupyter nbconvert ").unwrap();
        assert_eq!(config.program, "python3");
        assert_eq!(config.args, vec!["-m", "jupyter", "nbconvert"]);
    }

    #[test]
    fn test_blank_command_line() {
        assert!(ExecutorConfig::from_command_line("").is_none());
        assert!(ExecutorConfig::from_command_line("   ").is_none());
    }

    #[test]
    fn test_missing_program() {
        let config = ExecutorConfig::from_command_line("runorder-no-such-executor-xyz").unwrap();
        assert!(matches!(
            config.resolve(),
            Err(RunError::ExecutorNotFound { program, .. }) if program == "runorder-no-such-executor-xyz"
        ));
    }
}
