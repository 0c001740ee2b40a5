use super::{ExecMode, ProbeError, ProbeResult};
use std::process::{Command, Stdio};
use tracing::debug;

pub const DEFAULT_SHELL: &str = "/bin/bash";
pub const STARTUP_FILE_VAR: &str = "BASH_ENV";

/// Shell used for `ExecMode::LoginShell` and the startup file it is forced to source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    pub shell: String,
    pub startup_file: String,
}

impl ShellSettings {
    pub fn new(startup_file: impl Into<String>) -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            startup_file: startup_file.into(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

/// A fully resolved process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<String>,
}

impl Invocation {
    pub fn direct(command: &str, args: &[&str]) -> Self {
        Self {
            program: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Bash only reads `BASH_ENV` for non-interactive shells, which is exactly how
    /// deployment runners invoke it.
    pub fn login_shell(command: &str, args: &[&str], shell: &ShellSettings) -> Self {
        let script = std::iter::once(command)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            program: shell.shell.clone(),
            args: vec!["-c".to_string(), script],
            env: vec![(STARTUP_FILE_VAR.to_string(), shell.startup_file.clone())],
            cwd: None,
        }
    }

    pub fn for_mode(command: &str, args: &[&str], mode: ExecMode, shell: &ShellSettings) -> Self {
        match mode {
            ExecMode::Direct => Self::direct(command, args),
            ExecMode::LoginShell => Self::login_shell(command, args, shell),
        }
    }

    /// Shell-pasteable rendering for logs and failure messages.
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, quote(v)))
            .collect();
        parts.push(quote(&self.program));
        parts.extend(self.args.iter().map(|a| quote(a)));
        parts.join(" ")
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Executes invocations somewhere: the local process table or a container.
pub trait CommandRunner: Send + Sync {
    /// Runs to completion and captures output. Only failure to launch is an error here;
    /// exit status is reported in the result.
    fn run(&self, invocation: &Invocation) -> Result<ProbeResult, ProbeError>;

    /// Resolves `tool` against `PATH` the way `execve` would, without a shell.
    fn lookup(&self, tool: &str) -> Result<Option<String>, ProbeError>;
}

/// Runs commands as children of the current process.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProbeResult, ProbeError> {
        debug!(command = %invocation.command_line(), "Running");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null());
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .map_err(|e| ProbeError::Launch {
                command: invocation.command_line(),
                reason: e.to_string(),
            })?;

        Ok(ProbeResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }

    fn lookup(&self, tool: &str) -> Result<Option<String>, ProbeError> {
        match which::which(tool) {
            Ok(found) => Ok(Some(found.display().to_string())),
            Err(which::Error::CannotFindBinaryPath) => Ok(None),
            Err(e) => Err(ProbeError::Launch {
                command: format!("lookup {}", tool),
                reason: e.to_string(),
            }),
        }
    }
}
