//! `snaplock run`: run a command under the process-wide lock.

use crate::cli::RunArgs;
use snaplock::config::Config;
use snaplock::error::{Result, SnapLockError};
use snaplock::guard::{FlockBackend, ProcessGuard};
use std::os::unix::process::ExitStatusExt;
use std::process::Command;
use std::time::Duration;

pub fn cmd_run(config: &Config, args: RunArgs) -> Result<i32> {
    let mut guard = ProcessGuard::with_backend(
        FlockBackend::new(config.lock_path(), config.privilege_check).with_action(&args.action),
    );

    let run = || spawn(&args.command);
    if args.retry {
        guard.with_guard_retry(&config.retry_policy(), announce_wait, run)
    } else {
        guard.with_guard(run)
    }
}

fn announce_wait(wait: Duration, _attempt: u32) {
    eprintln!(
        "Another snap operation is running, will try again in {} seconds...\n\
         Press ctrl-c to cancel.",
        wait.as_secs()
    );
}

/// Run `argv` to completion and map its status to an exit code.
///
/// A command killed by a signal maps to `128 + signal`, as shells do.
fn spawn(argv: &[String]) -> Result<i32> {
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| SnapLockError::UserError("no command given".to_string()))?;

    tracing::debug!(program = %program, "running guarded command");
    let status = Command::new(program).args(rest).status().map_err(|e| {
        SnapLockError::CommandError(format!("failed to run '{}': {}", program, e))
    })?;

    Ok(status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1))
}
