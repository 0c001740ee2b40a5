use super::{CommandRunner, Invocation, ProbeError, ProbeResult};
use bollard::container::LogOutput;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures_util::stream::StreamExt;
use tokio::runtime::Runtime;
use tracing::debug;

/// Runs probes inside an already running container through the Docker exec API, so an
/// image can be checked from the host without installing the harness into it.
pub struct ContainerRunner {
    docker: Docker,
    container: String,
    runtime: Runtime,
}

impl ContainerRunner {
    pub fn connect(container: impl Into<String>) -> Result<Self, ProbeError> {
        let container = container.into();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| ProbeError::Launch {
                command: format!("docker exec {}", container),
                reason: format!("Failed to start async runtime: {}", e),
            })?;

        let docker = {
            let _guard = runtime.enter();
            Docker::connect_with_local_defaults().map_err(|e| ProbeError::Launch {
                command: format!("docker exec {}", container),
                reason: format!("Failed to connect to Docker: {}", e),
            })?
        };

        Ok(Self {
            docker,
            container,
            runtime,
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    async fn exec(&self, invocation: &Invocation) -> Result<ProbeResult, bollard::errors::Error> {
        let cmd: Vec<String> = std::iter::once(invocation.program.clone())
            .chain(invocation.args.iter().cloned())
            .collect();
        let env: Vec<String> = invocation
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        let exec = self
            .docker
            .create_exec(
                &self.container,
                CreateExecOptions {
                    cmd: Some(cmd),
                    env: Some(env),
                    working_dir: invocation.cwd.clone(),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(chunk) = output.next().await {
                match chunk? {
                    LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                    LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                    _ => {}
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;

        Ok(ProbeResult {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            status: inspect.exit_code.map(|code| code as i32),
        })
    }
}

impl CommandRunner for ContainerRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProbeResult, ProbeError> {
        debug!(container = %self.container, command = %invocation.command_line(), "Exec");

        self.runtime
            .block_on(self.exec(invocation))
            .map_err(|e| ProbeError::Launch {
                command: invocation.command_line(),
                reason: e.to_string(),
            })
    }

    /// Reads the container's `PATH` and returns the first candidate that is an executable
    /// regular file.
    fn lookup(&self, tool: &str) -> Result<Option<String>, ProbeError> {
        let path = self.run(&Invocation::direct("printenv", &["PATH"]))?;
        if !path.success() {
            return Ok(None);
        }

        for dir in path.trimmed().split(':').filter(|d| !d.is_empty()) {
            let candidate = format!("{}/{}", dir.trim_end_matches('/'), tool);
            if self
                .run(&executable_file_check(&candidate))?
                .success()
            {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }
}

/// `test` succeeds only for a regular file with the execute bit, so directories on `PATH`
/// are skipped.
fn executable_file_check(candidate: &str) -> Invocation {
    Invocation::direct("test", &["-f", candidate, "-a", "-x", candidate])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_must_be_executable_file() {
        assert_eq!(
            executable_file_check("/usr/local/bin/node").command_line(),
            "test -f /usr/local/bin/node -a -x /usr/local/bin/node"
        );
    }
}
