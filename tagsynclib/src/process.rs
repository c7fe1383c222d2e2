/*
 * tagsync - external commands
 *
 * Copyright 2026 The tagsync authors
 *
 * This file is part of tagsync.
 *
 * tagsync is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * tagsync is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with tagsync. If not, see <http://www.gnu.org/licenses/>.
 */

//! Running the external sync and reindex commands.

use std::process::{Command, ExitStatus, Stdio};

use crate::error::{Error, ErrorKind, Result, ResultIntoError};

/// Run `command` through `sh -c` with inherited standard streams and wait
/// for it to finish.
pub fn run_shell_command(command: &str) -> Result<ExitStatus> {
    if command.trim().is_empty() {
        return Err(Error::new("External command is empty.").set_kind(ErrorKind::Configuration));
    }
    log::trace!("running `{command}`");
    Command::new("sh")
        .args(["-c", command])
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .chain_err_summary(|| format!("Could not launch `{command}`"))
        .chain_err_kind(ErrorKind::External)
}

/// Outcome of an external command, as far as the run is concerned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandOutcome {
    Succeeded,
    /// Spawn failure or non-zero exit. Logged, never fatal.
    Failed,
    /// Not run because of dry-run mode.
    Skipped,
}

/// Run an external command for the phase `what`, logging instead of
/// propagating failures.
pub fn run_phase_command(what: &str, command: &str, dry_run: bool) -> CommandOutcome {
    if dry_run {
        log::info!("Would run {what} command `{command}`.");
        return CommandOutcome::Skipped;
    }
    log::info!("Running {what} command `{command}`.");
    match run_shell_command(command) {
        Ok(status) if status.success() => CommandOutcome::Succeeded,
        Ok(status) => {
            log::warn!("{what} command `{command}` exited with {status}.");
            CommandOutcome::Failed
        }
        Err(err) => {
            log::warn!("{err}");
            CommandOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_status() {
        assert!(run_shell_command("true").unwrap().success());
        assert_eq!(run_shell_command("exit 3").unwrap().code(), Some(3));
        assert!(run_shell_command("  ").is_err());
    }

    #[test]
    fn test_process_phase_outcome() {
        assert_eq!(
            run_phase_command("sync", "true", false),
            CommandOutcome::Succeeded
        );
        assert_eq!(
            run_phase_command("sync", "false", false),
            CommandOutcome::Failed
        );
        assert_eq!(
            run_phase_command("sync", "false", true),
            CommandOutcome::Skipped
        );
    }
}
