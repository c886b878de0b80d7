//! runorder CLI - Enforce sequential execution of Jupyter notebooks.

mod check;
mod colors;
mod hook;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "runorder")]
#[command(about = "Check that notebooks were run in order and reproduce their outputs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check notebooks (recursively for directories; current directory if none given)
    Check {
        /// Notebook files or directories
        paths: Vec<PathBuf>,

        /// Only check the run order, do not re-execute notebooks
        #[arg(long)]
        no_run: bool,

        /// Executor command line (default: $RUNORDER_EXECUTOR or "jupyter nbconvert")
        #[arg(long)]
        executor: Option<String>,
    },

    /// Manage the git hook that runs `runorder check`
    Hook {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Subcommand)]
enum HookAction {
    /// Add the check to a git hook
    Add {
        /// Hook name (pre-commit, pre-push or pre-rebase)
        hook: String,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Remove the check from a git hook
    Remove {
        /// Hook name (pre-commit, pre-push or pre-rebase)
        hook: String,

        /// Repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            paths,
            no_run,
            executor,
        } => check::execute(paths, no_run, executor.as_deref()).await?,

        Commands::Hook { action } => match action {
            HookAction::Add { hook: name, repo } => hook::add(&repo, &name)?,
            HookAction::Remove { hook: name, repo } => hook::remove(&repo, &name)?,
        },
    }

    Ok(())
}
