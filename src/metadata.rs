use std::collections::HashMap;
use std::path::Path;

use ex::fs::read;
use serde_derive::{Deserialize, Serialize};
use serde_yaml::from_slice;

use crate::error::IntegrationError;

/// Relation endpoint as declared by a charm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    /// The interface schema that this relation conforms to
    pub interface: String,
}

/// The parts of a charm's metadata.yaml file that matter for relation endpoints
///
/// Any other keys are ignored, so that this can be pointed at the metadata of whichever charm
/// happens to embed the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    /// The name of the charm
    pub name: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub description: String,

    /// Map of relations required by this charm
    ///
    /// Each key represents the name of the relation as known by this charm
    #[serde(default)]
    pub requires: HashMap<String, Relation>,

    /// Map of relations provided by this charm
    #[serde(default)]
    pub provides: HashMap<String, Relation>,

    /// Map of peer relations
    #[serde(default)]
    pub peers: HashMap<String, Relation>,
}

impl Metadata {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IntegrationError> {
        Self::load_from_bytes(&read(path.as_ref())?)
    }

    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, IntegrationError> {
        Ok(from_slice(bytes)?)
    }

    /// Names of the `requires` endpoints speaking `interface`, sorted
    pub fn endpoints_for(&self, interface: &str) -> Vec<&str> {
        let mut names: Vec<_> = self
            .requires
            .iter()
            .filter(|(_, rel)| rel.interface == interface)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
