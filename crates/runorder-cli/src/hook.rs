//! Git hook management.
//!
//! Adds or removes a delimited block that runs `runorder check` in a
//! repository's `.git/hooks/<hook>` script, leaving the rest of the script
//! untouched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Hooks the check may be installed into.
pub const VALID_HOOKS: [&str; 3] = ["pre-commit", "pre-push", "pre-rebase"];

const COMMAND_NAME: &str = "runorder";

/// The block inserted into a hook script.
fn hook_block() -> String {
    format!(
        "\n\n### BEGIN AUTOMATICALLY GENERATED - {COMMAND_NAME} ###\n\n\
         {COMMAND_NAME} check\n\n\
         ### END AUTOMATICALLY GENERATED ###\n\n"
    )
}

/// Whether `script` holds the block, ignoring surrounding blank lines.
fn contains_block(script: &str) -> bool {
    script.contains(hook_block().trim())
}

/// Remove the block, with its blank-line padding when still intact.
fn strip_block(script: &str) -> String {
    let block = hook_block();
    let target = if script.contains(&block) {
        block.as_str()
    } else {
        block.trim()
    };
    script.replace(target, "")
}

/// What `add` did to the hook script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    Appended,
    AlreadyPresent,
}

fn check_hook_name(hook: &str) -> Result<()> {
    if !VALID_HOOKS.contains(&hook) {
        bail!(
            "Invalid hook name: {hook}. Valid hook names are: {}",
            VALID_HOOKS.join(", ")
        );
    }
    Ok(())
}

fn hook_path(repo: &Path, hook: &str) -> Result<PathBuf> {
    check_hook_name(hook)?;
    let git_dir = repo.join(".git");
    if !git_dir.is_dir() {
        bail!("{} is not a git repository", repo.display());
    }
    Ok(git_dir.join("hooks").join(hook))
}

fn read_existing(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn write_script(path: &Path, script: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, script).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Add the check to `hook`, creating the script if needed.
pub fn add_hook(repo: &Path, hook: &str) -> Result<AddOutcome> {
    let path = hook_path(repo, hook)?;
    let block = hook_block();

    let (script, outcome) = match read_existing(&path)? {
        Some(existing) if contains_block(&existing) => {
            return Ok(AddOutcome::AlreadyPresent);
        }
        Some(existing) => (existing + &block, AddOutcome::Appended),
        None => (format!("#!/usr/bin/env bash{block}"), AddOutcome::Created),
    };

    write_script(&path, &script)?;
    tracing::debug!(path = %path.display(), ?outcome, "updated hook");
    Ok(outcome)
}

/// Remove the check from `hook`.
pub fn remove_hook(repo: &Path, hook: &str) -> Result<()> {
    let path = hook_path(repo, hook)?;

    let Some(existing) = read_existing(&path)? else {
        bail!("Hook {hook} does not exist.");
    };
    if !contains_block(&existing) {
        bail!("Hook {hook} does not contain command {COMMAND_NAME}.");
    }

    write_script(&path, &strip_block(&existing))
}

/// Execute `hook add`.
pub fn add(repo: &Path, hook: &str) -> Result<()> {
    match add_hook(repo, hook)? {
        AddOutcome::Created => println!("Hook {hook} does not exist. Created it."),
        AddOutcome::Appended => {
            println!("Hook {hook} already exists. Appended {COMMAND_NAME} to it.")
        }
        AddOutcome::AlreadyPresent => println!("Hook {hook} already exists for {COMMAND_NAME}."),
    }
    Ok(())
}

/// Execute `hook remove`.
pub fn remove(repo: &Path, hook: &str) -> Result<()> {
    remove_hook(repo, hook)?;
    println!("Removed {COMMAND_NAME} from hook {hook}.");
    Ok(())
}
