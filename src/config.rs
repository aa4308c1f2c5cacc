//! Realm configuration

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What reading an unresolved link does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Raise a ReferenceError naming the link
    #[default]
    Strict,
    /// Read as `undefined`; writes are dropped
    Lenient,
}

/// Settings applied to every class and instance of a realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    pub link_policy: LinkPolicy,
    /// Seal public instances once construction finishes
    pub seal_instances: bool,
    /// Log a warning when Super() is called on a constructor's behalf
    pub warn_implicit_super: bool,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            link_policy: LinkPolicy::Strict,
            seal_instances: true,
            warn_implicit_super: true,
        }
    }
}

impl RealmConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(source: &str) -> Result<Self, Error> {
        serde_json::from_str(source)
            .map_err(|e| Error::definition_error(format!("invalid realm configuration: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::internal_error(e.to_string()))
    }
}
