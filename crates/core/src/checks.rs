//! Catalogue of environment checks for one image variant.

use crate::expected::{
    expected_login_path, expected_node_tool, expected_path, expected_python,
    expected_python_tool, expected_workdir, ExpectationError, NODE_TOOLS, PYTHON_TOOLS,
};
use crate::probe::{CommandRunner, ExecMode, ProbeError, Prober};
use crate::variant::{ImageVariant, Runtime};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Expectation {
    /// Trimmed stdout equals `expected`.
    Output {
        expected: String,
        command: String,
        args: Vec<String>,
    },
    Prefix {
        prefix: String,
        command: String,
        args: Vec<String>,
    },
    Succeeds {
        command: String,
        args: Vec<String>,
    },
    Resolves {
        tool: String,
        expected: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentCheck {
    pub name: String,
    pub mode: ExecMode,
    pub expectation: Expectation,
}

impl EnvironmentCheck {
    fn new(group: &str, mode: ExecMode, expectation: Expectation) -> Self {
        Self {
            name: format!("{}/{}", group, mode.slug()),
            mode,
            expectation,
        }
    }
}

fn output(expected: impl Into<String>, command: &str, args: &[&str]) -> Expectation {
    Expectation::Output {
        expected: expected.into(),
        command: command.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

fn resolves(tool: &str, expected: String) -> Expectation {
    Expectation::Resolves {
        tool: tool.to_string(),
        expected,
    }
}

fn both_modes(group: &str, expectation: Expectation) -> [EnvironmentCheck; 2] {
    ExecMode::ALL.map(|mode| EnvironmentCheck::new(group, mode, expectation.clone()))
}

pub fn for_variant(variant: &ImageVariant) -> Result<Vec<EnvironmentCheck>, ExpectationError> {
    let mut checks = Vec::new();

    if variant.has_runtime(&Runtime::Python) {
        let python = expected_python(variant)?;
        checks.extend(both_modes("python/python", resolves("python", python)));
        for tool in PYTHON_TOOLS {
            let expected = expected_python_tool(variant, tool)?;
            checks.extend(both_modes(&format!("python/{}", tool), resolves(tool, expected)));
        }
    }

    if variant.has_runtime(&Runtime::Nodejs) {
        for tool in NODE_TOOLS {
            let expected = expected_node_tool(variant, tool)?;
            checks.extend(both_modes(&format!("node/{}", tool), resolves(tool, expected)));
        }
        checks.push(EnvironmentCheck::new(
            "yarn-classic",
            ExecMode::Direct,
            Expectation::Prefix {
                prefix: "1.".to_string(),
                command: "yarn".to_string(),
                args: vec!["--version".to_string()],
            },
        ));
    }

    checks.push(EnvironmentCheck::new(
        &format!("{}/path", variant),
        ExecMode::Direct,
        output(expected_path(variant)?, "printenv", &["PATH"]),
    ));
    checks.push(EnvironmentCheck::new(
        &format!("{}/path", variant),
        ExecMode::LoginShell,
        output(expected_login_path(variant)?, "printenv", &["PATH"]),
    ));

    for tool in ["curl", "git"] {
        checks.push(EnvironmentCheck::new(
            tool,
            ExecMode::Direct,
            Expectation::Succeeds {
                command: tool.to_string(),
                args: vec!["--version".to_string()],
            },
        ));
    }

    checks.extend(both_modes("workdir", output(expected_workdir(variant), "pwd", &[])));
    checks.extend(both_modes("user", output(variant.user(), "whoami", &[])));
    checks.extend(both_modes(
        "home",
        output(variant.home(), "printenv", &["HOME"]),
    ));

    Ok(checks)
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct CheckRunner<R> {
    prober: Prober<R>,
}

impl<R: CommandRunner> CheckRunner<R> {
    pub fn new(prober: Prober<R>) -> Self {
        Self { prober }
    }

    pub fn prober(&self) -> &Prober<R> {
        &self.prober
    }

    pub fn run(&self, check: &EnvironmentCheck) -> Result<(), ProbeError> {
        let prober = &self.prober;
        let mode = check.mode;

        match &check.expectation {
            Expectation::Output {
                expected,
                command,
                args,
            } => prober.assert_output(expected, command, &as_strs(args), mode),
            Expectation::Prefix {
                prefix,
                command,
                args,
            } => prober.assert_prefix(prefix, command, &as_strs(args), mode),
            Expectation::Succeeds { command, args } => {
                prober.assert_succeeds(command, &as_strs(args), mode)
            }
            Expectation::Resolves { tool, expected } => {
                prober.assert_resolves(tool, expected, mode)
            }
        }
    }

    /// Runs every check sequentially, collecting failures instead of stopping at the first.
    pub fn run_all(&self, checks: &[EnvironmentCheck]) -> Vec<CheckOutcome> {
        checks
            .iter()
            .map(|check| match self.run(check) {
                Ok(()) => {
                    info!(check = %check.name, "Passed");
                    CheckOutcome {
                        name: check.name.clone(),
                        passed: true,
                        message: None,
                    }
                }
                Err(e) => {
                    warn!(check = %check.name, error = %e, "Failed");
                    CheckOutcome {
                        name: check.name.clone(),
                        passed: false,
                        message: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}
