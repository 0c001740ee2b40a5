//! Language-version fixture programs: discovery, ordering and copying.

use crate::serial::SerialGroup;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

const NODE_PREFIX: &str = "node-";
/// Must run before the other node fixtures change the default node version.
pub const NODE_DEFAULT: &str = "node-default";

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to copy {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub name: String,
    pub path: PathBuf,
}

impl Fixture {
    /// Node fixtures switch a container-wide default and must not overlap.
    pub fn serial_group(&self) -> Option<SerialGroup> {
        self.name
            .starts_with(NODE_PREFIX)
            .then_some(SerialGroup::RuntimeVersion)
    }

    pub fn is_node_default(&self) -> bool {
        self.name == NODE_DEFAULT
    }
}

/// Fixture directories under `root`, `node-default` first and the rest by name.
pub fn discover(root: &Path) -> Result<Vec<Fixture>, FixtureError> {
    let mut fixtures = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| FixtureError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        fixtures.push(Fixture {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.into_path(),
        });
    }

    fixtures.sort_by(|a, b| {
        b.is_node_default()
            .cmp(&a.is_node_default())
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(fixtures)
}

/// Copies the tree under `src` into `dest`, creating directories as needed. Returns the
/// number of files copied.
pub fn copy_fixture(src: &Path, dest: &Path) -> Result<usize, FixtureError> {
    let mut copied = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| FixtureError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| FixtureError::Io {
                path: target.clone(),
                source,
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| FixtureError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            copied += 1;
        }
    }

    debug!(src = %src.display(), dest = %dest.display(), copied, "Copied fixture");
    Ok(copied)
}
