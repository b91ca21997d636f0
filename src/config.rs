//! Build configuration.
//!
//! An optional `ontograph.toml` next to the working directory pins the
//! system-of-record location and artifact path so CI and local builds
//! agree. CLI flags override file values; file values override the
//! built-in defaults.

use serde::{Deserialize, Serialize};
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use crate::error::OntographError;

pub const CONFIG_FILE_NAME: &str = "ontograph.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding the YAML record files.
    pub yaml_dir: PathBuf,
    /// Output path for the assembled graph artifact.
    pub artifact: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            yaml_dir: PathBuf::from("System_of_Record"),
            artifact: PathBuf::from("graph.json"),
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, OntographError> {
        tracing::debug!("Reading build config from {:?}", path);
        let content = read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Look for `ontograph.toml` in `dir`, falling back to defaults when
    /// absent. An existing-but-malformed file is still fatal.
    pub fn discover(dir: &Path) -> Result<Self, OntographError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No {CONFIG_FILE_NAME} found, using defaults");
            Ok(Self::default())
        }
    }
}
