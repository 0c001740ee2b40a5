//! Template test matrix: bare SDK templates followed by their cloud variants.

use crate::config::{HarnessConfig, GCP_PROJECT_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub type TemplateConfig = BTreeMap<String, String>;

/// Per-cloud configuration overrides, keyed by cloud name.
pub type CloudConfig = BTreeMap<String, TemplateConfig>;

pub const DEFAULT_SDKS: &[&str] = &["csharp", "python", "typescript", "go", "java"];

/// .NET releases the templates no longer target.
const UNSUPPORTED_DOTNET_VERSIONS: &[&str] = &["6.0"];

crate::define_id_enum! {
    /// Cloud providers with templates, in matrix order.
    Cloud {
        Gcp => "gcp",
        Azure => "azure",
        Aws => "aws",
    }
}

/// One template to create, deploy and destroy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub template: String,
    pub config: TemplateConfig,
}

impl TestCase {
    pub fn bare(sdk: &str) -> Self {
        Self {
            template: sdk.to_string(),
            config: TemplateConfig::new(),
        }
    }

    pub fn cloud(cloud: &str, sdk: &str, config: TemplateConfig) -> Self {
        Self {
            template: format!("{}-{}", cloud, sdk),
            config,
        }
    }
}

/// An `(sdk, cloud)` pairing left out of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExclusionRule {
    pub sdk: String,
    pub cloud: String,
}

impl ExclusionRule {
    pub fn new(sdk: impl Into<String>, cloud: impl Into<String>) -> Self {
        Self {
            sdk: sdk.into(),
            cloud: cloud.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: HashSet<ExclusionRule>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rule: ExclusionRule) {
        self.rules.insert(rule);
    }

    pub fn contains(&self, sdk: &str, cloud: &str) -> bool {
        self.rules.contains(&ExclusionRule::new(sdk, cloud))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<ExclusionRule> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ExclusionRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

impl<S: Into<String>, C: Into<String>> FromIterator<(S, C)> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = (S, C)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(sdk, cloud)| ExclusionRule::new(sdk, cloud))
            .collect()
    }
}

/// Expands SDKs and clouds into the ordered list of template test cases.
///
/// A non-empty `override_sdks` replaces `sdks` outright. Output is sdk-major: each SDK's
/// bare template, then `<cloud>-<sdk>` for every cloud in order unless excluded. Clouds
/// without an entry in `cloud_config` get an empty config.
pub fn build_matrix<S, C>(
    sdks: &[S],
    clouds: &[C],
    cloud_config: &CloudConfig,
    exclusions: &ExclusionSet,
    override_sdks: Option<&[String]>,
) -> Vec<TestCase>
where
    S: AsRef<str>,
    C: AsRef<str>,
{
    let sdks: Vec<&str> = match override_sdks {
        Some(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
        _ => sdks.iter().map(|s| s.as_ref()).collect(),
    };

    let mut cases = Vec::with_capacity(sdks.len() * (1 + clouds.len()));
    for sdk in sdks {
        cases.push(TestCase::bare(sdk));

        for cloud in clouds {
            let cloud: &str = cloud.as_ref();
            if exclusions.contains(sdk, cloud) {
                debug!(sdk, cloud, "Skipping excluded template");
                continue;
            }
            let config = cloud_config.get(cloud).cloned().unwrap_or_default();
            cases.push(TestCase::cloud(cloud, sdk, config));
        }
    }

    cases
}

/// The matrix inputs a harness run derives from its configuration.
#[derive(Debug, Clone)]
pub struct MatrixInputs {
    pub sdks: Vec<String>,
    pub clouds: Vec<String>,
    pub cloud_config: CloudConfig,
    pub exclusions: ExclusionSet,
    pub override_sdks: Vec<String>,
}

impl MatrixInputs {
    pub fn from_config(config: &HarnessConfig) -> Self {
        let mut sdks: Vec<String> = DEFAULT_SDKS.iter().map(|s| s.to_string()).collect();
        let mut override_sdks = config.sdks_override.clone();

        if let Some(version) = config.language_version.as_deref() {
            if UNSUPPORTED_DOTNET_VERSIONS.contains(&version) {
                debug!(version, "Dropping csharp templates for unsupported .NET version");
                sdks.retain(|s| s != "csharp");
                override_sdks.retain(|s| s != "csharp");
                if override_sdks.is_empty() && !config.sdks_override.is_empty() {
                    sdks.clear();
                }
            }
        }

        Self {
            sdks,
            clouds: Cloud::all_variants()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            cloud_config: default_cloud_config(config.get(GCP_PROJECT_NAME)),
            exclusions: config.exclusions.iter().cloned().collect(),
            override_sdks,
        }
    }

    pub fn build(&self) -> Vec<TestCase> {
        build_matrix(
            &self.sdks,
            &self.clouds,
            &self.cloud_config,
            &self.exclusions,
            Some(self.override_sdks.as_slice()),
        )
    }
}

/// Azure needs a location and GCP a project; AWS takes its region from the environment.
pub fn default_cloud_config(gcp_project: Option<&str>) -> CloudConfig {
    let mut config = CloudConfig::new();

    config.insert(
        Cloud::Azure.name().to_string(),
        TemplateConfig::from([(
            "azure-native:location".to_string(),
            "EastUS".to_string(),
        )]),
    );
    config.insert(Cloud::Aws.name().to_string(), TemplateConfig::new());

    let mut gcp = TemplateConfig::new();
    if let Some(project) = gcp_project {
        gcp.insert("gcp:project".to_string(), project.to_string());
    }
    config.insert(Cloud::Gcp.name().to_string(), gcp);

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HarnessConfig, LANGUAGE_VERSION, SDKS_TO_TEST};

    fn templates(cases: &[TestCase]) -> Vec<&str> {
        cases.iter().map(|c| c.template.as_str()).collect()
    }

    #[test]
    fn test_python_go_on_aws() {
        let config = CloudConfig::from([("aws".to_string(), TemplateConfig::new())]);
        let cases = build_matrix(
            &["python", "go"],
            &["aws"],
            &config,
            &ExclusionSet::new(),
            None,
        );

        assert_eq!(
            cases,
            vec![
                TestCase::bare("python"),
                TestCase::cloud("aws", "python", TemplateConfig::new()),
                TestCase::bare("go"),
                TestCase::cloud("aws", "go", TemplateConfig::new()),
            ]
        );
    }

    #[test]
    fn test_excluded_pair_is_dropped() {
        let azure = TemplateConfig::from([("loc".to_string(), "EastUS".to_string())]);
        let config = CloudConfig::from([("azure".to_string(), azure)]);
        let exclusions: ExclusionSet = [("typescript", "azure")].into_iter().collect();

        let cases = build_matrix(&["typescript"], &["azure"], &config, &exclusions, None);

        assert_eq!(cases, vec![TestCase::bare("typescript")]);
    }

    #[test]
    fn test_cloud_entries_carry_cloud_config() {
        let azure = TemplateConfig::from([("loc".to_string(), "EastUS".to_string())]);
        let config = CloudConfig::from([("azure".to_string(), azure.clone())]);

        let cases = build_matrix(&["go"], &["azure"], &config, &ExclusionSet::new(), None);

        assert_eq!(cases[1].template, "azure-go");
        assert_eq!(cases[1].config, azure);
        assert!(cases[0].config.is_empty());
    }

    #[test]
    fn test_size_without_exclusions() {
        let sdks = ["a", "b", "c"];
        let clouds = ["x", "y"];
        for n_sdks in 0..=sdks.len() {
            for n_clouds in 0..=clouds.len() {
                let cases = build_matrix(
                    &sdks[..n_sdks],
                    &clouds[..n_clouds],
                    &CloudConfig::new(),
                    &ExclusionSet::new(),
                    None,
                );
                assert_eq!(cases.len(), n_sdks * (1 + n_clouds));
            }
        }
    }

    #[test]
    fn test_no_excluded_template_appears() {
        let exclusions: ExclusionSet = [("go", "gcp"), ("java", "aws"), ("python", "azure")]
            .into_iter()
            .collect();
        let cases = build_matrix(
            DEFAULT_SDKS,
            &["gcp", "azure", "aws"],
            &CloudConfig::new(),
            &exclusions,
            None,
        );

        let names = templates(&cases);
        assert!(!names.contains(&"gcp-go"));
        assert!(!names.contains(&"aws-java"));
        assert!(!names.contains(&"azure-python"));
        assert_eq!(cases.len(), DEFAULT_SDKS.len() * 4 - 3);
    }

    #[test]
    fn test_exclusion_lookup_is_exact_and_deduplicated() {
        let mut exclusions: ExclusionSet = [("go", "gcp"), ("go", "gcp")].into_iter().collect();
        exclusions.insert(ExclusionRule::new("go", "gcp"));

        assert_eq!(exclusions.len(), 1);
        assert!(exclusions.contains("go", "gcp"));
        assert!(!exclusions.contains("gcp", "go"));
        assert!(!exclusions.contains("go", "aws"));
        assert!(!exclusions.contains("golang", "gcp"));
    }

    #[test]
    fn test_deterministic() {
        let config = default_cloud_config(Some("proj"));
        let run = || {
            build_matrix(
                DEFAULT_SDKS,
                &["gcp", "azure", "aws"],
                &config,
                &ExclusionSet::new(),
                None,
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_override_replaces_sdks() {
        let override_sdks = vec!["go".to_string(), "python".to_string()];
        let cases = build_matrix(
            DEFAULT_SDKS,
            &["aws"],
            &CloudConfig::new(),
            &ExclusionSet::new(),
            Some(override_sdks.as_slice()),
        );

        let bare: Vec<&str> = cases
            .iter()
            .filter(|c| !c.template.contains('-'))
            .map(|c| c.template.as_str())
            .collect();
        assert_eq!(bare, vec!["go", "python"]);
    }

    #[test]
    fn test_empty_override_keeps_sdks() {
        let cases = build_matrix(
            &["java"],
            &Vec::<String>::new(),
            &CloudConfig::new(),
            &ExclusionSet::new(),
            Some(&[][..]),
        );
        assert_eq!(templates(&cases), vec!["java"]);
    }

    #[test]
    fn test_default_cloud_config() {
        let config = default_cloud_config(Some("my-project"));
        assert_eq!(config["azure"]["azure-native:location"], "EastUS");
        assert!(config["aws"].is_empty());
        assert_eq!(config["gcp"]["gcp:project"], "my-project");

        let config = default_cloud_config(None);
        assert!(config["gcp"].is_empty());
    }

    #[test]
    fn test_inputs_from_config() {
        let config = HarnessConfig::from_lookup(|key| match key {
            SDKS_TO_TEST => Some("go".to_string()),
            _ => None,
        })
        .unwrap()
        .with_value(GCP_PROJECT_NAME, "proj-1");

        let cases = MatrixInputs::from_config(&config).build();
        assert_eq!(templates(&cases), vec!["go", "gcp-go", "azure-go", "aws-go"]);
        assert_eq!(cases[1].config["gcp:project"], "proj-1");
    }

    #[test]
    fn test_dotnet_six_drops_csharp() {
        let config = HarnessConfig::from_lookup(|key| match key {
            LANGUAGE_VERSION => Some("6.0".to_string()),
            _ => None,
        })
        .unwrap();

        let cases = MatrixInputs::from_config(&config).build();
        assert!(cases.iter().all(|c| !c.template.ends_with("csharp")));
        assert_eq!(cases.len(), (DEFAULT_SDKS.len() - 1) * 4);
    }

    #[test]
    fn test_dotnet_six_with_csharp_only_override_is_empty() {
        let config = HarnessConfig::from_lookup(|key| match key {
            LANGUAGE_VERSION => Some("6.0".to_string()),
            SDKS_TO_TEST => Some("csharp".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(MatrixInputs::from_config(&config).build().is_empty());
    }

    #[test]
    fn test_exclusions_flow_from_config() {
        let config = HarnessConfig::from_lookup(|key| match key {
            crate::config::MATRIX_EXCLUSIONS => Some("java:azure".to_string()),
            _ => None,
        })
        .unwrap();

        let cases = MatrixInputs::from_config(&config).build();
        assert!(!templates(&cases).contains(&"azure-java"));
        assert!(templates(&cases).contains(&"aws-java"));
    }

    #[test]
    fn test_cloud_order() {
        let names: Vec<&str> = Cloud::all_variants().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["gcp", "azure", "aws"]);
    }
}
