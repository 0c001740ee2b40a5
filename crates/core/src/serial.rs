//! Process-wide locks for checks that mutate shared machine state.
//!
//! Switching a language runtime version (fnm, pyenv) changes global shims, so those
//! checks must not interleave even though everything else runs in parallel.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

static RUNTIME_VERSION: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SerialGroup {
    RuntimeVersion,
}

impl SerialGroup {
    /// Blocks until the group is free. A sibling that panicked while holding the lock
    /// leaves nothing to clean up, so poisoning is ignored.
    pub fn lock(self) -> MutexGuard<'static, ()> {
        let mutex = match self {
            SerialGroup::RuntimeVersion => &RUNTIME_VERSION,
        };
        debug!(group = %self, "Waiting for serial group");
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Display for SerialGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialGroup::RuntimeVersion => write!(f, "runtime-version"),
        }
    }
}
