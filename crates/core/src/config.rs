use crate::variant::{ImageVariant, VariantError};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use thiserror::Error;

pub const PULUMI_ACCESS_TOKEN: &str = "PULUMI_ACCESS_TOKEN";
pub const PULUMI_ORG: &str = "PULUMI_ORG";
pub const ARM_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ARM_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";
pub const ARM_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ARM_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_REGION: &str = "AWS_REGION";
pub const GCP_PROJECT_NAME: &str = "GCP_PROJECT_NAME";
pub const GCP_PROJECT_NUMBER: &str = "GCP_PROJECT_NUMBER";
pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const IMAGE_VARIANT: &str = "IMAGE_VARIANT";
pub const SDKS_TO_TEST: &str = "SDKS_TO_TEST";
pub const LANGUAGE_VERSION: &str = "LANGUAGE_VERSION";
pub const MATRIX_EXCLUSIONS: &str = "MATRIX_EXCLUSIONS";
pub const RUN_CONTAINER_TESTS: &str = "RUN_CONTAINER_TESTS";
pub const PROBE_CONTAINER: &str = "PROBE_CONTAINER";
pub const LOG_LEVEL: &str = "IMAGEPROBE_LOG_LEVEL";

/// Variables the template suite cannot run without.
pub const TEMPLATE_SUITE_VARIABLES: &[&str] = &[
    PULUMI_ACCESS_TOKEN,
    PULUMI_ORG,
    ARM_CLIENT_ID,
    ARM_CLIENT_SECRET,
    ARM_TENANT_ID,
    AWS_ACCESS_KEY_ID,
    AWS_SECRET_ACCESS_KEY,
    AWS_SESSION_TOKEN,
    GCP_PROJECT_NAME,
    GOOGLE_APPLICATION_CREDENTIALS,
];

const SECRET_VARIABLES: &[&str] = &[
    PULUMI_ACCESS_TOKEN,
    ARM_CLIENT_SECRET,
    AWS_SECRET_ACCESS_KEY,
    AWS_SESSION_TOKEN,
];

const TRACKED_VARIABLES: &[&str] = &[
    PULUMI_ACCESS_TOKEN,
    PULUMI_ORG,
    ARM_CLIENT_ID,
    ARM_CLIENT_SECRET,
    ARM_TENANT_ID,
    ARM_SUBSCRIPTION_ID,
    AWS_ACCESS_KEY_ID,
    AWS_SECRET_ACCESS_KEY,
    AWS_SESSION_TOKEN,
    AWS_REGION,
    GCP_PROJECT_NAME,
    GCP_PROJECT_NUMBER,
    GOOGLE_APPLICATION_CREDENTIALS,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable {0:?} not set")]
    MissingVariable(String),

    #[error("Invalid IMAGE_VARIANT: {0}")]
    InvalidVariant(#[from] VariantError),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Settings for one harness run, read once from the process environment.
///
/// Blank values count as unset, matching how CI leaves optional secrets empty.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    values: BTreeMap<String, String>,
    pub image_variant: Option<ImageVariant>,
    pub sdks_override: Vec<String>,
    pub language_version: Option<String>,
    pub exclusions: Vec<(String, String)>,
    pub container_tests_enabled: bool,
    pub probe_container: Option<String>,
}

impl HarnessConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let values = TRACKED_VARIABLES
            .iter()
            .filter_map(|&key| get(key).map(|v| (key.to_string(), v)))
            .collect();

        let image_variant = get(IMAGE_VARIANT)
            .map(|v| ImageVariant::parse(&v))
            .transpose()?;

        let sdks_override = get(SDKS_TO_TEST)
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let exclusions = match get(MATRIX_EXCLUSIONS) {
            Some(raw) => parse_exclusions(&raw)?,
            None => Vec::new(),
        };

        let container_tests_enabled = match get(RUN_CONTAINER_TESTS) {
            Some(raw) => parse_flag(RUN_CONTAINER_TESTS, &raw)?,
            None => false,
        };

        Ok(Self {
            values,
            image_variant,
            sdks_override,
            language_version: get(LANGUAGE_VERSION).map(|v| v.trim().to_string()),
            exclusions,
            container_tests_enabled,
            probe_container: get(PROBE_CONTAINER),
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value or a `MissingVariable` error naming the key.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    /// Checks a set of variables at once, reporting the first one missing.
    pub fn require_all(&self, keys: &[&str]) -> Result<(), ConfigError> {
        keys.iter().try_for_each(|key| self.require(key).map(|_| ()))
    }

    pub fn require_variant(&self) -> Result<&ImageVariant, ConfigError> {
        self.image_variant
            .as_ref()
            .ok_or_else(|| ConfigError::MissingVariable(IMAGE_VARIANT.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `sdk:cloud` pairs separated by commas.
pub fn parse_exclusions(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|pair| match pair.split_once(':') {
            Some((sdk, cloud)) if !sdk.trim().is_empty() && !cloud.trim().is_empty() => {
                Ok((sdk.trim().to_string(), cloud.trim().to_string()))
            }
            _ => Err(ConfigError::ParseError {
                field: MATRIX_EXCLUSIONS.to_string(),
                error: format!("expected sdk:cloud, got '{}'", pair),
            }),
        })
        .collect()
}

fn parse_flag(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            field: field.to_string(),
            error: format!("expected a boolean, got '{}'", other),
        }),
    }
}

impl fmt::Display for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Harness Configuration:")?;
        match &self.image_variant {
            Some(v) => writeln!(f, "  Image Variant: {}", v)?,
            None => writeln!(f, "  Image Variant: <unset>")?,
        }
        if !self.sdks_override.is_empty() {
            writeln!(f, "  SDK Override: {}", self.sdks_override.join(","))?;
        }
        if let Some(ref version) = self.language_version {
            writeln!(f, "  Language Version: {}", version)?;
        }
        for (sdk, cloud) in &self.exclusions {
            writeln!(f, "  Excluded: {}-{}", cloud, sdk)?;
        }
        writeln!(f, "  Container Tests: {}", self.container_tests_enabled)?;
        for key in TRACKED_VARIABLES {
            let shown = match self.get(key) {
                Some(_) if SECRET_VARIABLES.contains(key) => "<set>",
                Some(v) => v,
                None => "<unset>",
            };
            writeln!(f, "  {}: {}", key, shown)?;
        }
        Ok(())
    }
}
