//! Dual-context environment probing.
//!
//! A probe runs a command and compares its trimmed stdout to an expected value. The same
//! check can run in two contexts: directly, as a container entrypoint would, or through
//! bash with the user's startup file forced in via `BASH_ENV`, as deployment runners do.
//! Installers that only edit `.bashrc` make the two diverge, which is the regression
//! these probes exist to catch.

pub mod container;
pub mod mock;
pub mod runner;

pub use container::ContainerRunner;
pub use mock::MockRunner;
pub use runner::{CommandRunner, Invocation, ShellSettings, SystemRunner};

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecMode {
    Direct,
    LoginShell,
}

impl ExecMode {
    pub const ALL: [ExecMode; 2] = [ExecMode::Direct, ExecMode::LoginShell];

    pub fn slug(&self) -> &'static str {
        match self {
            ExecMode::Direct => "direct",
            ExecMode::LoginShell => "login-shell",
        }
    }
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecMode::Direct => write!(f, "without shell"),
            ExecMode::LoginShell => write!(f, "in login shell"),
        }
    }
}

/// Captured output of one command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeResult {
    pub stdout: String,
    pub stderr: String,
    pub status: Option<i32>,
}

impl ProbeResult {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to launch `{command}`: {reason}")]
    Launch { command: String, reason: String },

    #[error("`{command}` exited with {}\nstdout: {stdout}\nstderr: {stderr}", describe_status(.status))]
    ExitStatus {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` ({mode}) output mismatch\n  expected: {expected:?}\n  actual:   {actual:?}")]
    Mismatch {
        command: String,
        mode: ExecMode,
        expected: String,
        actual: String,
    },

    #[error("`{command}` ({mode}) output does not start with {prefix:?}\n  actual: {actual:?}")]
    PrefixMismatch {
        command: String,
        mode: ExecMode,
        prefix: String,
        actual: String,
    },

    #[error("`{tool}` not found on PATH")]
    NotOnPath { tool: String },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

impl ProbeError {
    /// Launch failures and non-zero exits, as opposed to wrong output.
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            ProbeError::Launch { .. } | ProbeError::ExitStatus { .. } | ProbeError::NotOnPath { .. }
        )
    }
}

/// Runs `invocation` and turns a non-zero exit into `ProbeError::ExitStatus`.
pub fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    invocation: &Invocation,
) -> Result<ProbeResult, ProbeError> {
    let result = runner.run(invocation)?;
    if !result.success() {
        return Err(ProbeError::ExitStatus {
            command: invocation.command_line(),
            status: result.status,
            stdout: result.stdout,
            stderr: result.stderr,
        });
    }
    Ok(result)
}

/// Runs commands through a `CommandRunner` and asserts on their output.
pub struct Prober<R = SystemRunner> {
    runner: R,
    shell: ShellSettings,
}

impl Prober<SystemRunner> {
    pub fn system(shell: ShellSettings) -> Self {
        Self::new(SystemRunner::new(), shell)
    }
}

impl<R: CommandRunner> Prober<R> {
    pub fn new(runner: R, shell: ShellSettings) -> Self {
        Self { runner, shell }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn shell(&self) -> &ShellSettings {
        &self.shell
    }

    /// Runs a command and fails on launch errors or non-zero exit.
    pub fn capture(
        &self,
        command: &str,
        args: &[&str],
        mode: ExecMode,
    ) -> Result<ProbeResult, ProbeError> {
        let invocation = Invocation::for_mode(command, args, mode, &self.shell);
        info!(%mode, command = %invocation.command_line(), "Probing");
        run_checked(&self.runner, &invocation)
    }

    pub fn assert_output(
        &self,
        expected: &str,
        command: &str,
        args: &[&str],
        mode: ExecMode,
    ) -> Result<(), ProbeError> {
        let result = self.capture(command, args, mode)?;
        let actual = result.trimmed();
        if actual != expected {
            return Err(ProbeError::Mismatch {
                command: Invocation::for_mode(command, args, mode, &self.shell).command_line(),
                mode,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        debug!(%mode, command, "Output matched");
        Ok(())
    }

    /// Asserts the same output with and without the login shell.
    pub fn assert_output_all_modes(
        &self,
        expected: &str,
        command: &str,
        args: &[&str],
    ) -> Result<(), ProbeError> {
        ExecMode::ALL
            .iter()
            .try_for_each(|mode| self.assert_output(expected, command, args, *mode))
    }

    pub fn assert_prefix(
        &self,
        prefix: &str,
        command: &str,
        args: &[&str],
        mode: ExecMode,
    ) -> Result<(), ProbeError> {
        let result = self.capture(command, args, mode)?;
        let actual = result.trimmed();
        if !actual.starts_with(prefix) {
            return Err(ProbeError::PrefixMismatch {
                command: Invocation::for_mode(command, args, mode, &self.shell).command_line(),
                mode,
                prefix: prefix.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    pub fn assert_succeeds(
        &self,
        command: &str,
        args: &[&str],
        mode: ExecMode,
    ) -> Result<(), ProbeError> {
        self.capture(command, args, mode).map(|_| ())
    }

    /// Checks where `tool` resolves. Without a shell this is a plain `PATH` search; in the
    /// login shell it is bash's `command -v`.
    pub fn assert_resolves(
        &self,
        tool: &str,
        expected: &str,
        mode: ExecMode,
    ) -> Result<(), ProbeError> {
        match mode {
            ExecMode::Direct => {
                let found = self
                    .runner
                    .lookup(tool)?
                    .ok_or_else(|| ProbeError::NotOnPath {
                        tool: tool.to_string(),
                    })?;
                if found != expected {
                    return Err(ProbeError::Mismatch {
                        command: format!("lookup {}", tool),
                        mode,
                        expected: expected.to_string(),
                        actual: found,
                    });
                }
                Ok(())
            }
            ExecMode::LoginShell => self.assert_output(expected, "command", &["-v", tool], mode),
        }
    }
}
