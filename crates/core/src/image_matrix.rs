//! CI matrices for building and mirroring the per-language images.
//!
//! Every combination is listed explicitly under `include`, so the workflow matrix has no
//! variables of its own.

use serde::Serialize;

pub const ARCHS: &[&str] = &["amd64", "arm64"];
const BASE_IMAGE: &str = "pulumi-base";

/// An SDK published with a default runtime version plus suffixed extra versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedSdk {
    pub sdk: String,
    pub default: String,
    pub additional: Vec<String>,
}

impl VersionedSdk {
    fn new(sdk: &str, default: &str, additional: &[&str]) -> Self {
        Self {
            sdk: sdk.to_string(),
            default: default.to_string(),
            additional: additional.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn all_versions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.default.as_str()).chain(self.additional.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkVersions {
    /// SDKs with a single runtime version and no suffixed images.
    pub unversioned: Vec<String>,
    pub versioned: Vec<VersionedSdk>,
}

impl Default for SdkVersions {
    fn default() -> Self {
        Self {
            unversioned: vec!["go".to_string(), "dotnet".to_string(), "java".to_string()],
            versioned: vec![
                VersionedSdk::new("python", "3.9", &["3.10", "3.11", "3.12"]),
                VersionedSdk::new("nodejs", "18", &["20", "22"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEntry {
    pub sdk: String,
    /// The default version is pushed twice, with and without its suffix.
    pub default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMatrix {
    pub include: Vec<BuildEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncMatrix {
    pub image: Vec<String>,
}

/// Build matrix for the per-language images. Without arch the entries describe the
/// multi-arch manifests instead of the per-arch builds.
pub fn generate(versions: &SdkVersions, include_arch: bool) -> BuildMatrix {
    let archs: Vec<Option<&str>> = if include_arch {
        ARCHS.iter().map(|a| Some(*a)).collect()
    } else {
        vec![None]
    };

    let mut include = Vec::new();
    for arch in archs {
        let arch = arch.map(str::to_string);

        for sdk in &versions.unversioned {
            include.push(BuildEntry {
                sdk: sdk.clone(),
                default: true,
                language_version: None,
                arch: arch.clone(),
                suffix: None,
            });
        }

        for versioned in &versions.versioned {
            for version in versioned.all_versions() {
                include.push(BuildEntry {
                    sdk: versioned.sdk.clone(),
                    default: version == versioned.default,
                    language_version: Some(version.to_string()),
                    arch: arch.clone(),
                    suffix: Some(format!("-{}", version)),
                });
            }
        }
    }

    BuildMatrix { include }
}

/// Image names mirrored to the secondary registries.
pub fn sync_images(versions: &SdkVersions) -> SyncMatrix {
    let mut image = vec![BASE_IMAGE.to_string()];
    image.extend(versions.unversioned.iter().map(|sdk| format!("pulumi-{}", sdk)));

    for versioned in &versions.versioned {
        image.push(format!("pulumi-{}", versioned.sdk));
        image.extend(
            versioned
                .all_versions()
                .map(|v| format!("pulumi-{}-{}", versioned.sdk, v)),
        );
    }

    SyncMatrix { image }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_counts() {
        let versions = SdkVersions::default();
        // 3 unversioned + 4 python + 3 nodejs
        assert_eq!(generate(&versions, true).include.len(), 20);
        assert_eq!(generate(&versions, false).include.len(), 10);
    }

    #[test]
    fn test_entry_shape() {
        let matrix = generate(&SdkVersions::default(), true);
        let value = serde_json::to_value(&matrix).unwrap();

        assert_eq!(
            value["include"][0],
            json!({"sdk": "go", "default": true, "arch": "amd64"})
        );
        assert_eq!(
            value["include"][3],
            json!({
                "sdk": "python",
                "default": true,
                "language_version": "3.9",
                "arch": "amd64",
                "suffix": "-3.9"
            })
        );
        assert_eq!(value["include"][4]["default"], json!(false));
        assert_eq!(value["include"][10]["arch"], json!("arm64"));
    }

    #[test]
    fn test_no_arch_omits_field() {
        let matrix = generate(&SdkVersions::default(), false);
        assert!(matrix.include.iter().all(|e| e.arch.is_none()));

        let text = serde_json::to_string(&matrix).unwrap();
        assert!(!text.contains("arch"));
    }

    #[test]
    fn test_one_default_per_versioned_sdk_and_arch() {
        let matrix = generate(&SdkVersions::default(), true);
        for sdk in ["python", "nodejs"] {
            for arch in ARCHS {
                let defaults = matrix
                    .include
                    .iter()
                    .filter(|e| e.sdk == sdk && e.arch.as_deref() == Some(*arch) && e.default)
                    .count();
                assert_eq!(defaults, 1, "{} {}", sdk, arch);
            }
        }
    }

    #[test]
    fn test_sync_images() {
        let images = sync_images(&SdkVersions::default()).image;
        assert_eq!(images[0], "pulumi-base");
        assert_eq!(&images[1..4], ["pulumi-go", "pulumi-dotnet", "pulumi-java"]);
        assert_eq!(images[4], "pulumi-python");
        assert_eq!(images[5], "pulumi-python-3.9");
        assert!(images.contains(&"pulumi-nodejs-22".to_string()));
        assert_eq!(images.len(), 1 + 3 + 5 + 4);
    }
}
