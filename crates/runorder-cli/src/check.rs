//! Check command implementation for runorder CLI.
//!
//! Discovers notebooks and verifies them one at a time, reporting every
//! notebook before deciding the exit status.

use std::path::{Path, PathBuf};

use anyhow::Context;
use runorder_core::{
    Error, ExecutorConfig, ProcessRunner, Verifier, VerifyOptions, discover,
};

use crate::colors;

/// Outcome counts for one check run.
#[derive(Debug, Default)]
struct Summary {
    verified: usize,
    failed: usize,
}

/// Execute the check command.
pub async fn execute(
    paths: Vec<PathBuf>,
    no_run: bool,
    executor: Option<&str>,
) -> anyhow::Result<()> {
    if no_run {
        eprintln!(
            "{}Warning:{} --no-run only checks execution counts and will not catch every problem. \
             A notebook can pass while its outputs are stale. Consider moving long-running code \
             to a separate task instead.",
            colors::YELLOW,
            colors::RESET
        );
    }

    let config = match executor {
        Some(command_line) => ExecutorConfig::from_command_line(command_line)
            .context("--executor must name a program")?,
        None => ExecutorConfig::from_env(),
    };
    tracing::debug!(?config, "executor configuration");

    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let runner = ProcessRunner::new(config);
    let kill_handle = runner.kill_handle();
    let verifier = Verifier::new(runner).with_options(VerifyOptions {
        skip_reexecution: no_run,
    });

    // The executor runs in its own process group and never sees signals sent
    // to ours, so they are registered before any executor can start.
    let mut shutdown = Shutdown::install().context("failed to install signal handlers")?;

    // Verification blocks on the executor; keep it off the runtime so signals
    // can still be observed and forwarded to the executor's process group.
    let mut task = tokio::task::spawn_blocking(move || check_all(&verifier, &paths));

    let summary = tokio::select! {
        joined = &mut task => joined.context("check task panicked")?,
        code = shutdown.recv() => {
            eprintln!("\n{}Interrupted{}, stopping executor...", colors::YELLOW, colors::RESET);
            kill_handle.kill();
            // Wait for the runner to unwind so its scratch directory is removed.
            let _ = task.await;
            std::process::exit(code);
        }
    };

    finish(&summary)
}

/// Signals that stop a check run: Ctrl-C, plus SIGTERM and SIGHUP on unix.
struct Shutdown {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

impl Shutdown {
    #[cfg(unix)]
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for a signal and return the conventional `128 + signo` exit code.
    #[cfg(unix)]
    async fn recv(&mut self) -> i32 {
        tokio::select! {
            _ = self.interrupt.recv() => {
                tracing::debug!("received SIGINT");
                130
            }
            _ = self.terminate.recv() => {
                tracing::debug!("received SIGTERM");
                143
            }
            _ = self.hangup.recv() => {
                tracing::debug!("received SIGHUP");
                129
            }
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> i32 {
        let _ = tokio::signal::ctrl_c().await;
        130
    }
}

fn check_all(verifier: &Verifier, paths: &[PathBuf]) -> Summary {
    let mut summary = Summary::default();
    let kill_handle = verifier.runner().kill_handle();

    for path in paths {
        let notebooks = match discover(path) {
            Ok(notebooks) => notebooks,
            Err(e) => {
                report_failure(path, "invalid-path", &e);
                summary.failed += 1;
                continue;
            }
        };

        for notebook in notebooks {
            if kill_handle.is_killed() {
                return summary;
            }

            match verifier.verify_file(&notebook) {
                Ok(()) => {
                    println!(
                        "{}✓{} Notebook {} was run correctly.",
                        colors::GREEN,
                        colors::RESET,
                        notebook.display()
                    );
                    summary.verified += 1;
                }
                Err(Error::InvalidRun(e)) => {
                    report_failure(&notebook, e.kind().as_str(), &e);
                    summary.failed += 1;
                }
                Err(e) => {
                    report_failure(&notebook, "unreadable-notebook", &e);
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}

fn report_failure(path: &Path, kind: &str, error: &dyn std::fmt::Display) {
    eprintln!(
        "{}✗{} {}{}{} [{}]\n\n{}\n",
        colors::RED,
        colors::RESET,
        colors::BOLD,
        path.display(),
        colors::RESET,
        kind,
        error
    );
}

fn finish(summary: &Summary) -> anyhow::Result<()> {
    let total = summary.verified + summary.failed;

    if summary.failed > 0 {
        anyhow::bail!(
            "{} of {} notebooks failed verification",
            summary.failed,
            total
        );
    }

    if total == 0 {
        println!("{}No notebooks found.{}", colors::YELLOW, colors::RESET);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_fails_when_any_notebook_failed() {
        let summary = Summary {
            verified: 2,
            failed: 1,
        };
        let err = finish(&summary).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 notebooks failed verification");
    }

    #[test]
    fn test_finish_succeeds() {
        assert!(finish(&Summary { verified: 3, failed: 0 }).is_ok());
        assert!(finish(&Summary::default()).is_ok());
    }

    #[test]
    fn test_check_all_continues_after_failure() {
        let verifier = Verifier::default().with_options(VerifyOptions {
            skip_reexecution: true,
        });
        let paths = vec![
            PathBuf::from("/nonexistent/runorder/a.txt"),
            PathBuf::from("/nonexistent/runorder/b.ipynb"),
        ];

        let summary = check_all(&verifier, &paths);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.verified, 0);
    }
}
