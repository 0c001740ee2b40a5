use super::{CommandRunner, Invocation, ProbeError, ProbeResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Scripted runner keyed by rendered command line. Unscripted commands fail to launch,
/// like a binary missing from the image.
pub struct MockRunner {
    responses: RwLock<HashMap<String, ProbeResult>>,
    path: RwLock<HashMap<String, String>>,
    calls: RwLock<Vec<Invocation>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            path: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Successful exit with `stdout`.
    pub fn respond(&self, command_line: &str, stdout: &str) {
        self.respond_with(
            command_line,
            ProbeResult {
                stdout: stdout.to_string(),
                stderr: String::new(),
                status: Some(0),
            },
        );
    }

    pub fn respond_with(&self, command_line: &str, result: ProbeResult) {
        self.responses
            .write()
            .unwrap()
            .insert(command_line.to_string(), result);
    }

    pub fn on_path(&self, tool: &str, location: &str) {
        self.path
            .write()
            .unwrap()
            .insert(tool.to_string(), location.to_string());
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.read().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProbeResult, ProbeError> {
        self.calls.write().unwrap().push(invocation.clone());

        let command = invocation.command_line();
        self.responses
            .read()
            .unwrap()
            .get(&command)
            .cloned()
            .ok_or_else(|| ProbeError::Launch {
                command,
                reason: "No such file or directory (os error 2)".to_string(),
            })
    }

    fn lookup(&self, tool: &str) -> Result<Option<String>, ProbeError> {
        Ok(self.path.read().unwrap().get(tool).cloned())
    }
}
