//! Drives one create/update/destroy cycle of a stack with the `pulumi` CLI.

use crate::matrix::{TemplateConfig, TestCase};
use crate::probe::{run_checked, CommandRunner, Invocation, ProbeError, ProbeResult};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const PULUMI: &str = "pulumi";

#[derive(Debug, Error)]
pub enum StackError {
    #[error("Stack {stack}: `pulumi {step}` failed: {source}")]
    Step {
        step: &'static str,
        stack: String,
        #[source]
        source: ProbeError,
    },

    #[error("Stack {stack}: teardown failed after a successful run: {source}")]
    Teardown {
        stack: String,
        #[source]
        source: ProbeError,
    },
}

impl StackError {
    pub fn stack(&self) -> &str {
        match self {
            StackError::Step { stack, .. } | StackError::Teardown { stack, .. } => stack,
        }
    }
}

/// Where the project in the working directory comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSource {
    /// `pulumi new <template>` scaffolds the project and creates the stack.
    Template(String),
    /// The project is already in place; only the stack is created.
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOptions {
    pub skip_refresh: bool,
    /// Runs `pulumi install --use-language-version-tools` before `up`.
    pub install_language_versions: bool,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            skip_refresh: true,
            install_language_versions: false,
        }
    }
}

/// `<org>/container-<name>-<uuid>`, unique per call.
pub fn unique_stack_name(org: &str, name: &str) -> String {
    format!("{}/container-{}-{}", org, name, Uuid::new_v4().simple())
}

pub struct StackCycle<'a, R: ?Sized> {
    runner: &'a R,
    dir: PathBuf,
    stack: String,
    source: ProjectSource,
    config: TemplateConfig,
    options: StackOptions,
}

impl<'a, R: CommandRunner + ?Sized> StackCycle<'a, R> {
    pub fn from_template(runner: &'a R, dir: impl Into<PathBuf>, org: &str, case: &TestCase) -> Self {
        Self {
            runner,
            dir: dir.into(),
            stack: unique_stack_name(org, &case.template),
            source: ProjectSource::Template(case.template.clone()),
            config: case.config.clone(),
            options: StackOptions::default(),
        }
    }

    pub fn from_program(runner: &'a R, dir: impl Into<PathBuf>, org: &str, name: &str) -> Self {
        Self {
            runner,
            dir: dir.into(),
            stack: unique_stack_name(org, name),
            source: ProjectSource::Existing,
            config: TemplateConfig::new(),
            options: StackOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_config(mut self, config: TemplateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn pulumi(&self, step: &'static str, args: &[&str]) -> Result<ProbeResult, StackError> {
        let invocation =
            Invocation::direct(PULUMI, args).in_dir(self.dir.display().to_string());
        info!(stack = %self.stack, step, "Running pulumi");

        run_checked(self.runner, &invocation).map_err(|source| StackError::Step {
            step,
            stack: self.stack.clone(),
            source,
        })
    }

    /// Runs the whole cycle. The stack is removed even when a step fails; the step's
    /// error wins over a teardown error.
    pub fn run(&self) -> Result<(), StackError> {
        let result = self.deploy();
        let teardown = self.teardown();

        match (result, teardown) {
            (Err(e), Err(td)) => {
                warn!(stack = %self.stack, error = %td, "Teardown failed");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), Err(StackError::Step { source, .. })) => Err(StackError::Teardown {
                stack: self.stack.clone(),
                source,
            }),
            (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    fn deploy(&self) -> Result<(), StackError> {
        let stack = self.stack.as_str();

        match &self.source {
            ProjectSource::Template(template) => {
                self.pulumi("new", &["new", template, "-y", "-f", "-s", stack])?;
            }
            ProjectSource::Existing => {
                self.pulumi("stack init", &["stack", "init", stack])?;
            }
        }

        for (key, value) in &self.config {
            self.pulumi("config set", &["config", "set", key, value, "--stack", stack])?;
        }

        if self.options.install_language_versions {
            self.pulumi("install", &["install", "--use-language-version-tools"])?;
        }

        self.pulumi("up", &["up", "--yes", "--skip-preview", "--stack", stack])?;

        if !self.options.skip_refresh {
            self.pulumi("refresh", &["refresh", "--yes", "--stack", stack])?;
        }

        self.pulumi("destroy", &["destroy", "--yes", "--skip-preview", "--stack", stack])?;
        Ok(())
    }

    fn teardown(&self) -> Result<(), StackError> {
        self.pulumi(
            "stack rm",
            &["stack", "rm", "--force", "--yes", "--stack", &self.stack],
        )
        .map(|_| ())
    }
}
