//! Smoke checks for the cloud CLIs shipped in the images: each one logs in with the
//! credentials from the environment and confirms it talks to the expected account.

use crate::config::{
    ConfigError, HarnessConfig, ARM_CLIENT_ID, ARM_CLIENT_SECRET, ARM_SUBSCRIPTION_ID,
    ARM_TENANT_ID, AWS_ACCESS_KEY_ID, AWS_REGION, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN,
    GCP_PROJECT_NAME, GCP_PROJECT_NUMBER, GOOGLE_APPLICATION_CREDENTIALS,
};
use crate::probe::{run_checked, CommandRunner, Invocation, ProbeError};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_AWS_PRINCIPAL: &str = "pulumi-docker-containers@githubActions";
const EXEC_CREDENTIAL_KIND: &str = "ExecCredential";

#[derive(Debug, Error)]
pub enum CloudError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("`{command}` did not print JSON: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{command}` output has no string field {field:?}")]
    MissingField { command: String, field: &'static str },

    #[error("{what}: expected {expected:?}, got {actual:?}")]
    Unexpected {
        what: &'static str,
        expected: String,
        actual: String,
    },
}

pub struct CloudChecks<'a, R: ?Sized> {
    runner: &'a R,
    config: &'a HarnessConfig,
    aws_principal: String,
}

impl<'a, R: CommandRunner + ?Sized> CloudChecks<'a, R> {
    pub fn new(runner: &'a R, config: &'a HarnessConfig) -> Self {
        Self {
            runner,
            config,
            aws_principal: DEFAULT_AWS_PRINCIPAL.to_string(),
        }
    }

    pub fn with_aws_principal(mut self, principal: impl Into<String>) -> Self {
        self.aws_principal = principal.into();
        self
    }

    fn run(&self, command: &str, args: &[&str]) -> Result<String, CloudError> {
        let invocation = Invocation::direct(command, args);
        Ok(run_checked(self.runner, &invocation)?.stdout)
    }

    fn run_json(&self, command: &str, args: &[&str]) -> Result<Value, CloudError> {
        let stdout = self.run(command, args)?;
        serde_json::from_str(&stdout).map_err(|source| CloudError::InvalidJson {
            command: Invocation::direct(command, args).command_line(),
            source,
        })
    }

    pub fn azure(&self) -> Result<(), CloudError> {
        let client_id = self.config.require(ARM_CLIENT_ID)?;
        let secret = self.config.require(ARM_CLIENT_SECRET)?;
        let tenant = self.config.require(ARM_TENANT_ID)?;
        let subscription = self.config.require(ARM_SUBSCRIPTION_ID)?;

        info!("Logging in to Azure");
        self.run(
            "az",
            &[
                "login",
                "--service-principal",
                "--username",
                client_id,
                "--password",
                secret,
                "--tenant",
                tenant,
            ],
        )?;

        let account = self.run_json("az", &["account", "show"])?;
        let id = string_field(&account, "id", "az account show")?;
        expect_equal("Azure subscription", subscription, id)
    }

    pub fn aws(&self) -> Result<(), CloudError> {
        self.config.require_all(&[
            AWS_ACCESS_KEY_ID,
            AWS_SECRET_ACCESS_KEY,
            AWS_SESSION_TOKEN,
            AWS_REGION,
        ])?;

        info!("Checking AWS caller identity");
        let identity = self.run_json("aws", &["sts", "get-caller-identity"])?;
        let arn = string_field(&identity, "Arn", "aws sts get-caller-identity")?;
        if !arn.contains(self.aws_principal.as_str()) {
            return Err(CloudError::Unexpected {
                what: "AWS caller ARN",
                expected: self.aws_principal.clone(),
                actual: arn.to_string(),
            });
        }

        let token = self.run("aws-iam-authenticator", &["token", "--cluster-id", "test-123"])?;
        if !token.contains(EXEC_CREDENTIAL_KIND) {
            return Err(CloudError::Unexpected {
                what: "aws-iam-authenticator token kind",
                expected: EXEC_CREDENTIAL_KIND.to_string(),
                actual: token,
            });
        }
        Ok(())
    }

    pub fn gcp(&self) -> Result<(), CloudError> {
        let project = self.config.require(GCP_PROJECT_NAME)?;
        self.config.require(GCP_PROJECT_NUMBER)?;
        let credentials = self.config.require(GOOGLE_APPLICATION_CREDENTIALS)?;

        info!(project, "Logging in to GCP");
        self.run(
            "gcloud",
            &["--quiet", "auth", "login", "--force", "--cred-file", credentials],
        )?;
        self.run("gcloud", &["--quiet", "config", "set", "project", project])?;

        let info = self.run_json(
            "gcloud",
            &["--quiet", "projects", "describe", project, "--format", "json"],
        )?;
        let project_id = string_field(&info, "projectId", "gcloud projects describe")?;
        expect_equal("GCP project", project, project_id)
    }
}

fn string_field<'v>(
    value: &'v Value,
    field: &'static str,
    command: &str,
) -> Result<&'v str, CloudError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| CloudError::MissingField {
            command: command.to_string(),
            field,
        })
}

fn expect_equal(what: &'static str, expected: &str, actual: &str) -> Result<(), CloudError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CloudError::Unexpected {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
