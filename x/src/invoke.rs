//! Running the composed command
//!
//! The child shares our stdio and we block until it exits. Nothing is
//! retried and the child's output is never inspected.

use crate::command::ComposedCommand;
use anyhow::{bail, Context, Result};
use std::process::ExitStatus;

/// Spawns the tool and waits for it. Fails only if it could not be started.
pub fn run(cmd: &ComposedCommand) -> Result<ExitStatus> {
    cmd.to_command()
        .status()
        .with_context(|| format!("Failed to run `{}`", cmd.program().to_string_lossy()))
}

/// Turns a non-zero exit or a signal into an error naming the command.
pub fn check(cmd: &ComposedCommand, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    bail!(
        "`{} {}` failed ({})",
        cmd.program().to_string_lossy(),
        cmd.action().to_string_lossy(),
        status
    );
}
