//! Expected values for a variant: `PATH`, tool locations, workdir and identity.
//!
//! Every lookup is total over `ImageVariant`. Combinations the images do not publish
//! return `ExpectationError::UnmappedVariant` so a probe never compares against an
//! empty expectation.

use crate::variant::{Base, ImageVariant, Runtime};
use thiserror::Error;

const FNM_BIN: &str = "/usr/local/share/fnm/aliases/default/bin";
const PYENV_SHIM_PYTHON: &str = "/usr/local/share/pyenv/shims/python";
const LOCAL_BIN: &str = "/usr/local/bin";

/// Added to `PATH` by the installer's `.bashrc` hook on the root kitchen sink.
const INSTALLER_PATH_SUFFIX: &str = ":/root/.pulumi/bin";
/// UBI's default `.bashrc` prepends these.
const UBI_LOGIN_PATH_PREFIX: &str = "/root/.local/bin:/root/bin:";

const KITCHEN_SINK_PATH: &str = "/pulumi/bin:/usr/local/share/fnm/aliases/default/bin:/usr/local/share/pyenv/shims:/usr/local/share/pyenv/bin:/usr/local/share/dotnet:/go/bin:/usr/local/go/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

pub const NODE_TOOLS: &[&str] = &["node", "npm", "yarn", "corepack", "bun", "pnpm"];
pub const PYTHON_TOOLS: &[&str] = &["poetry", "uv"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpectationError {
    #[error("No expected {what} for image variant '{variant}'")]
    UnmappedVariant { variant: String, what: &'static str },

    #[error("Image variant '{variant}' does not include {runtime}")]
    MissingRuntime { variant: String, runtime: String },
}

fn unmapped(variant: &ImageVariant, what: &'static str) -> ExpectationError {
    ExpectationError::UnmappedVariant {
        variant: variant.as_str().to_string(),
        what,
    }
}

fn require_runtime(variant: &ImageVariant, runtime: Runtime) -> Result<(), ExpectationError> {
    if variant.has_runtime(&runtime) {
        Ok(())
    } else {
        Err(ExpectationError::MissingRuntime {
            variant: variant.as_str().to_string(),
            runtime: runtime.name().to_string(),
        })
    }
}

/// `PATH` as seen by a process started without any shell.
pub fn expected_path(variant: &ImageVariant) -> Result<&'static str, ExpectationError> {
    if variant.is_kitchen_sink() {
        return Ok(KITCHEN_SINK_PATH);
    }
    if variant.is_non_root() {
        return Err(unmapped(variant, "PATH"));
    }

    let runtime = variant.runtime().ok_or_else(|| unmapped(variant, "PATH"))?;
    let path = match (variant.base(), runtime) {
        (Base::Debian, Runtime::Dotnet) | (Base::Ubi, Runtime::Dotnet) => {
            "/root/.dotnet:/pulumi/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Debian, Runtime::Go) | (Base::Ubi, Runtime::Go) => {
            "/pulumi/bin:/go/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Debian, Runtime::Java) | (Base::Debian, Runtime::Nodejs) => {
            "/pulumi/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Debian, Runtime::Python) => {
            "/pulumi/bin:/usr/local/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Ubi, Runtime::Java) => {
            "/pulumi/bin:/root/.sdkman/candidates/maven/current/bin:/root/.sdkman/candidates/gradle/current/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Ubi, Runtime::Nodejs) => {
            "/pulumi/bin:/usr/local/share/fnm/aliases/default/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        (Base::Ubi, Runtime::Python) => {
            "/pulumi/bin:/usr/local/share/pyenv/shims:/usr/local/share/pyenv/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
        }
        _ => return Err(unmapped(variant, "PATH")),
    };

    Ok(path)
}

/// `PATH` after the login shell has sourced the startup file.
pub fn expected_login_path(variant: &ImageVariant) -> Result<String, ExpectationError> {
    let mut path = expected_path(variant)?.to_string();

    if variant.is_kitchen_sink() && !variant.is_non_root() {
        path.push_str(INSTALLER_PATH_SUFFIX);
    }
    if variant.is_ubi() {
        path.insert_str(0, UBI_LOGIN_PATH_PREFIX);
    }

    Ok(path)
}

pub fn expected_python(variant: &ImageVariant) -> Result<String, ExpectationError> {
    require_runtime(variant, Runtime::Python)?;
    if variant.is_kitchen_sink() || variant.is_ubi() {
        Ok(PYENV_SHIM_PYTHON.to_string())
    } else {
        Ok(format!("{}/python", LOCAL_BIN))
    }
}

/// Poetry and uv are installed system-wide on every python image.
pub fn expected_python_tool(variant: &ImageVariant, tool: &str) -> Result<String, ExpectationError> {
    require_runtime(variant, Runtime::Python)?;
    Ok(format!("{}/{}", LOCAL_BIN, tool))
}

pub fn expected_node_tool(variant: &ImageVariant, tool: &str) -> Result<String, ExpectationError> {
    require_runtime(variant, Runtime::Nodejs)?;
    let dir = match variant.base() {
        Base::Debian => LOCAL_BIN,
        Base::Ubi | Base::KitchenSink => FNM_BIN,
    };
    Ok(format!("{}/{}", dir, tool))
}

/// The kitchen sink does not set `WORKDIR`.
pub fn expected_workdir(variant: &ImageVariant) -> &'static str {
    if variant.is_kitchen_sink() {
        "/"
    } else {
        "/pulumi/projects"
    }
}

/// Startup file the login shell is forced to source.
pub fn startup_file(variant: &ImageVariant) -> String {
    format!("{}/.bashrc", variant.home())
}
