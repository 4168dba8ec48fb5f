//! Presents functions related to locating the charm directory

use std::env;
use std::path::PathBuf;

/// Get a dir from the first env var that is set, falling back to the current directory
fn dir_from_env(env_vars: &[&str]) -> PathBuf {
    env_vars
        .iter()
        .find_map(|var| env::var(var).ok())
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The root of the charm that is running this endpoint
pub fn charm_dir() -> PathBuf {
    dir_from_env(&["JUJU_CHARM_DIR", "CHARM_DIR"])
}

pub fn metadata_path() -> PathBuf {
    charm_dir().join("metadata.yaml")
}
