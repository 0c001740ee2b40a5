//! Image variant identifiers and the predicates that classify them.
//!
//! Variant names follow a fixed grammar:
//!
//! - `pulumi` and `pulumi-nonroot` are the kitchen-sink images bundling every runtime;
//! - `pulumi-<base>-<runtime>` are single-runtime images on `debian` or `ubi`;
//! - any of the above may carry a `-nonroot` suffix.
//!
//! Anything else is rejected at parse time so that a typo in `IMAGE_VARIANT` fails the
//! suite up front instead of producing empty expectations further down.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const IMAGE_PREFIX: &str = "pulumi";
const NON_ROOT_SUFFIX: &str = "-nonroot";

/// Every variant the image build publishes.
pub const KNOWN_VARIANTS: &[&str] = &[
    "pulumi",
    "pulumi-nonroot",
    "pulumi-debian-dotnet",
    "pulumi-debian-go",
    "pulumi-debian-java",
    "pulumi-debian-nodejs",
    "pulumi-debian-python",
    "pulumi-ubi-dotnet",
    "pulumi-ubi-go",
    "pulumi-ubi-java",
    "pulumi-ubi-nodejs",
    "pulumi-ubi-python",
];

crate::define_id_enum! {
    /// Language runtime shipped in an image.
    Runtime {
        Python => "python",
        Nodejs => "nodejs" | "node",
        Dotnet => "dotnet",
        Go => "go",
        Java => "java",
    }
}

/// Base distribution an image is built on. Exactly one holds per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Base {
    KitchenSink,
    Debian,
    Ubi,
}

impl Base {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "debian" => Some(Base::Debian),
            "ubi" => Some(Base::Ubi),
            _ => None,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::KitchenSink => write!(f, "kitchen-sink"),
            Base::Debian => write!(f, "debian"),
            Base::Ubi => write!(f, "ubi"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariantError {
    #[error("Image variant is empty")]
    Empty,

    #[error("Unknown image variant '{0}'. Expected pulumi[-nonroot] or pulumi-<debian|ubi>-<runtime>[-nonroot]")]
    Unrecognized(String),

    #[error("Unknown runtime '{runtime}' in image variant '{variant}'")]
    UnknownRuntime { variant: String, runtime: String },
}

/// A parsed image variant such as `pulumi-ubi-nodejs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageVariant {
    raw: String,
    base: Base,
    runtime: Option<Runtime>,
    non_root: bool,
}

impl ImageVariant {
    pub fn parse(raw: &str) -> Result<Self, VariantError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(VariantError::Empty);
        }

        let (stem, non_root) = match raw.strip_suffix(NON_ROOT_SUFFIX) {
            Some(stem) => (stem, true),
            None => (raw, false),
        };

        if stem == IMAGE_PREFIX {
            return Ok(Self {
                raw: raw.to_string(),
                base: Base::KitchenSink,
                runtime: None,
                non_root,
            });
        }

        let rest = stem
            .strip_prefix(IMAGE_PREFIX)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or_else(|| VariantError::Unrecognized(raw.to_string()))?;

        let (base_segment, runtime_segment) = rest
            .split_once('-')
            .ok_or_else(|| VariantError::Unrecognized(raw.to_string()))?;

        let base = Base::from_segment(base_segment)
            .ok_or_else(|| VariantError::Unrecognized(raw.to_string()))?;

        let runtime =
            Runtime::from_name(runtime_segment).ok_or_else(|| VariantError::UnknownRuntime {
                variant: raw.to_string(),
                runtime: runtime_segment.to_string(),
            })?;

        Ok(Self {
            raw: raw.to_string(),
            base,
            runtime: Some(runtime),
            non_root,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn base(&self) -> Base {
        self.base
    }

    /// The single runtime of a per-language image; `None` for the kitchen sink.
    pub fn runtime(&self) -> Option<&Runtime> {
        self.runtime.as_ref()
    }

    pub fn is_kitchen_sink(&self) -> bool {
        self.base == Base::KitchenSink
    }

    pub fn is_debian(&self) -> bool {
        self.base == Base::Debian
    }

    pub fn is_ubi(&self) -> bool {
        self.base == Base::Ubi
    }

    pub fn is_non_root(&self) -> bool {
        self.non_root
    }

    /// The kitchen sink includes every runtime.
    pub fn has_runtime(&self, runtime: &Runtime) -> bool {
        self.is_kitchen_sink() || self.runtime.as_ref() == Some(runtime)
    }

    pub fn user(&self) -> &'static str {
        if self.non_root {
            "pulumi"
        } else {
            "root"
        }
    }

    pub fn home(&self) -> &'static str {
        if self.non_root {
            "/home/pulumi"
        } else {
            "/root"
        }
    }
}

impl FromStr for ImageVariant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ImageVariant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

/// Flattened view of a variant's classification, used for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct VariantSummary {
    pub variant: String,
    pub base: Base,
    pub kitchen_sink: bool,
    pub non_root: bool,
    pub runtimes: Vec<Runtime>,
    pub user: String,
    pub home: String,
}

impl From<&ImageVariant> for VariantSummary {
    fn from(variant: &ImageVariant) -> Self {
        let runtimes = Runtime::all_variants()
            .iter()
            .filter(|r| variant.has_runtime(r))
            .cloned()
            .collect();

        Self {
            variant: variant.as_str().to_string(),
            base: variant.base(),
            kitchen_sink: variant.is_kitchen_sink(),
            non_root: variant.is_non_root(),
            runtimes,
            user: variant.user().to_string(),
            home: variant.home().to_string(),
        }
    }
}
